use tracing::{debug, warn};

use super::VideoItem;
use crate::utils::{PlayerError, PlayerResult};

/// Ordered items in playback order plus the index of the active one.
///
/// The index always points at an existing item. Navigation past either end
/// is a no-op; the list never wraps.
#[derive(Debug, Clone)]
pub struct Playlist {
    items: Vec<VideoItem>,
    current_index: usize,
    collection_name: Option<String>,
}

impl Playlist {
    pub fn new(
        items: Vec<VideoItem>,
        start_index: usize,
        collection_name: Option<String>,
    ) -> PlayerResult<Self> {
        if items.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }

        let last = items.len() - 1;
        let current_index = if start_index > last {
            warn!(
                start_index,
                len = items.len(),
                "Start index out of range, clamping to last item"
            );
            last
        } else {
            start_index
        };

        Ok(Self {
            items,
            current_index,
            collection_name,
        })
    }

    pub fn current(&self) -> &VideoItem {
        &self.items[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn items(&self) -> &[VideoItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_single_item(&self) -> bool {
        self.items.len() == 1
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection_name.as_deref()
    }

    /// Check if there's a next item available
    pub fn has_next(&self) -> bool {
        self.current_index + 1 < self.items.len()
    }

    /// Check if there's a previous item available
    pub fn has_previous(&self) -> bool {
        self.current_index > 0
    }

    /// Jump to `index`. Returns false when the index does not exist.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            warn!(index, len = self.items.len(), "Ignoring out-of-range selection");
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            debug!("No next item available");
            return false;
        }
        self.current_index += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            debug!("No previous item available");
            return false;
        }
        self.current_index -= 1;
        true
    }

    pub fn position_label(&self) -> String {
        let position = format!("Episode {} of {}", self.current_index + 1, self.items.len());
        match &self.collection_name {
            Some(name) if !name.is_empty() => format!("{} - {}", name, position),
            _ => position,
        }
    }
}
