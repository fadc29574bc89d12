use portal_player::models::VideoItem;

/// `count` direct-file lessons with numeric ids starting at 10.
pub fn lessons(count: usize) -> Vec<VideoItem> {
    (0..count)
        .map(|i| {
            VideoItem::new(
                (10 + i as i64).to_string(),
                format!("Lesson {}", i + 1),
                format!("https://d1abc.cloudfront.net/lessons/{}.mp4", i + 1),
            )
            .with_episode_number(i as u32 + 1)
        })
        .collect()
}

pub fn youtube_lesson(id: &str) -> VideoItem {
    VideoItem::new(id, "Guest lecture", "https://www.youtube.com/watch?v=dQw4w9WgXcQ")
}

pub fn missing_url_lesson(id: &str) -> VideoItem {
    VideoItem::new(id, "Draft lesson", "")
}
