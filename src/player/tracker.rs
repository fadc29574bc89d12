use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::transport::TransportState;
use crate::models::{ContentType, ProgressReport, ProgressStatus, UserId, VideoItem};
use crate::services::ProgressService;
use crate::utils::{duration_from_secs, format_playback_time};

/// Tracker tuning, normally taken from the `[progress]` and `[playback]`
/// config sections.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub enabled: bool,
    /// Cadence of the periodic report check
    pub tick_interval: Duration,
    /// Real time between unforced reports
    pub wall_interval: Duration,
    /// Playback time between unforced reports
    pub playback_interval: Duration,
    /// Stored completion at or above which playback restarts from zero
    pub completed_threshold: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval: Duration::from_secs(5),
            wall_interval: Duration::from_secs(5),
            playback_interval: Duration::from_secs(10),
            completed_threshold: 95.0,
        }
    }
}

/// Hybrid wall-clock / playback-time throttle for unforced reports.
#[derive(Debug, Clone)]
pub struct ReportThrottle {
    wall_interval: Duration,
    playback_interval: Duration,
    last_report_at: Option<Instant>,
    last_position: Duration,
}

impl ReportThrottle {
    pub fn new(wall_interval: Duration, playback_interval: Duration) -> Self {
        Self {
            wall_interval,
            playback_interval,
            last_report_at: None,
            last_position: Duration::ZERO,
        }
    }

    /// Whether enough real or playback time passed since the last report
    pub fn should_report(&self, now: Instant, position: Duration) -> bool {
        let Some(last) = self.last_report_at else {
            return true;
        };

        now.saturating_duration_since(last) >= self.wall_interval
            || position.abs_diff(self.last_position) >= self.playback_interval
    }

    pub fn record(&mut self, now: Instant, position: Duration) {
        self.last_report_at = Some(now);
        self.last_position = position;
    }

    pub fn reset(&mut self) {
        self.last_report_at = None;
        self.last_position = Duration::ZERO;
    }
}

/// Where a freshly selected item starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResumeDecision {
    StartOver,
    ResumeAt(Duration),
}

impl ResumeDecision {
    pub fn from_status(status: Option<&ProgressStatus>, completed_threshold: f64) -> Self {
        let Some(status) = status else {
            return Self::StartOver;
        };

        let completion = status.completion_percentage;
        if completion >= completed_threshold || completion <= 0.0 {
            return Self::StartOver;
        }

        let position = duration_from_secs(status.current_play_time);
        if position.is_zero() {
            Self::StartOver
        } else {
            Self::ResumeAt(position)
        }
    }

    /// Text for the transient resume notice
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::StartOver => None,
            Self::ResumeAt(position) => {
                Some(format!("Continuing from {}", format_playback_time(*position)))
            }
        }
    }
}

/// Work queued for the background worker, processed strictly in order.
#[derive(Debug)]
pub enum TrackerJob {
    StartSession {
        video_id: i64,
        collection_id: Option<i64>,
    },
    FetchStatus {
        generation: u64,
        video_id: i64,
        collection_id: Option<i64>,
    },
    Report(ProgressReport),
}

/// Stored status for the item selected at `generation`.
#[derive(Debug, Clone)]
pub struct TrackerReply {
    pub generation: u64,
    pub status: Option<ProgressStatus>,
}

#[derive(Debug, Clone, Copy)]
struct TrackedItem {
    video_id: i64,
    collection_id: Option<i64>,
}

/// Per-player progress bookkeeping. Lives inside the controller actor;
/// all network traffic is handed to [`TrackerWorker`].
pub struct ProgressTracker {
    settings: TrackerSettings,
    jobs: Option<mpsc::UnboundedSender<TrackerJob>>,
    throttle: ReportThrottle,
    active: Option<TrackedItem>,
    generation: u64,
    interval: Option<Interval>,
}

impl ProgressTracker {
    pub fn new(
        service: Arc<dyn ProgressService>,
        settings: TrackerSettings,
        replies: mpsc::UnboundedSender<TrackerReply>,
    ) -> (Self, TrackerWorker) {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let throttle = ReportThrottle::new(settings.wall_interval, settings.playback_interval);

        let tracker = Self {
            settings,
            jobs: Some(jobs_tx),
            throttle,
            active: None,
            generation: 0,
            interval: None,
        };
        let worker = TrackerWorker {
            service,
            jobs: jobs_rx,
            replies,
        };

        (tracker, worker)
    }

    pub fn is_tracking(&self) -> bool {
        self.active.is_some()
    }

    /// Open a session for a newly selected item.
    ///
    /// The session start is queued before the periodic tick is armed, so it
    /// always reaches the service ahead of any report for the item. Only
    /// native items get periodic reports and a resume lookup.
    pub fn begin_item(
        &mut self,
        item: &VideoItem,
        collection_id: Option<i64>,
        user: Option<&UserId>,
        native: bool,
        now: Instant,
    ) -> u64 {
        self.end_item();
        self.generation += 1;

        if !self.settings.enabled {
            return self.generation;
        }
        let Some(user) = user else {
            debug!("No signed-in user, progress tracking disabled");
            return self.generation;
        };
        let Some(video_id) = item.id.as_i64() else {
            debug!(video_id = %item.id, "Non-numeric video id, progress not tracked");
            return self.generation;
        };

        debug!(video_id, ?collection_id, user = %user, native, "Starting progress session");
        self.active = Some(TrackedItem {
            video_id,
            collection_id,
        });
        self.enqueue(TrackerJob::StartSession {
            video_id,
            collection_id,
        });

        if native {
            self.enqueue(TrackerJob::FetchStatus {
                generation: self.generation,
                video_id,
                collection_id,
            });
            let tick = self.settings.tick_interval;
            let mut interval = tokio::time::interval_at(now + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(interval);
        }

        self.generation
    }

    /// Cancel the periodic tick and forget the active item.
    pub fn end_item(&mut self) {
        self.interval = None;
        self.active = None;
        self.throttle.reset();
    }

    /// Push the current position. Unforced reports only go out while
    /// playing and when the throttle allows it.
    pub fn report(&mut self, now: Instant, transport: &TransportState, force: bool) -> bool {
        let Some(item) = self.active else {
            return false;
        };
        let Some(duration) = transport.duration.filter(|d| !d.is_zero()) else {
            trace!("Duration unknown, skipping progress report");
            return false;
        };
        if !force && (!transport.is_playing || !self.throttle.should_report(now, transport.current_time)) {
            return false;
        }

        let (content_type, content_id) = match item.collection_id {
            Some(collection_id) => (ContentType::TvShow, collection_id),
            None => (ContentType::Video, item.video_id),
        };
        let report = ProgressReport {
            video_id: item.video_id,
            current_play_time: transport.current_time.as_secs(),
            total_duration: duration.as_secs(),
            tv_show_id: item.collection_id,
            content_type,
            content_id,
            quality: transport.quality.clone(),
            playback_speed: transport.playback_speed,
            subtitle_language: transport.caption.clone(),
        };

        debug!(
            video_id = item.video_id,
            position = report.current_play_time,
            completion = report.completion_percentage(),
            force,
            "Reporting progress"
        );
        self.enqueue(TrackerJob::Report(report));
        self.throttle.record(now, transport.current_time);
        true
    }

    /// A status reply is only relevant for the selection that asked for it.
    pub fn accepts(&self, reply: &TrackerReply) -> bool {
        self.active.is_some() && reply.generation == self.generation
    }

    pub fn resume_decision(&self, status: Option<&ProgressStatus>) -> ResumeDecision {
        ResumeDecision::from_status(status, self.settings.completed_threshold)
    }

    /// Resolves on the next periodic tick; never resolves without an
    /// active native item.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Stop tracking and close the job queue. Jobs already queued still
    /// reach the service before the worker exits.
    pub fn shutdown(&mut self) {
        self.end_item();
        if self.jobs.take().is_some() {
            debug!("Progress tracker queue closed");
        }
    }

    fn enqueue(&self, job: TrackerJob) {
        if let Some(jobs) = &self.jobs {
            if jobs.send(job).is_err() {
                warn!("Progress worker is gone, dropping job");
            }
        }
    }
}

/// Sequential executor for tracker jobs. Failures are logged and dropped.
pub struct TrackerWorker {
    service: Arc<dyn ProgressService>,
    jobs: mpsc::UnboundedReceiver<TrackerJob>,
    replies: mpsc::UnboundedSender<TrackerReply>,
}

impl TrackerWorker {
    pub async fn run(mut self) {
        debug!("Progress worker started");

        while let Some(job) = self.jobs.recv().await {
            match job {
                TrackerJob::StartSession {
                    video_id,
                    collection_id,
                } => {
                    if let Err(e) = self.service.start_session(video_id, collection_id).await {
                        warn!(video_id, "Failed to start viewing session: {:#}", e);
                    }
                }
                TrackerJob::FetchStatus {
                    generation,
                    video_id,
                    collection_id,
                } => {
                    let status = match self.service.get_status(video_id, collection_id).await {
                        Ok(status) => status,
                        Err(e) => {
                            warn!(video_id, "Failed to fetch viewing status: {:#}", e);
                            None
                        }
                    };
                    let _ = self.replies.send(TrackerReply { generation, status });
                }
                TrackerJob::Report(report) => {
                    let video_id = report.video_id;
                    if let Err(e) = self.service.report_progress(&report).await {
                        warn!(video_id, "Failed to report progress: {:#}", e);
                    }
                }
            }
        }

        info!("Progress worker stopped");
    }
}
