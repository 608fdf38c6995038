//! Per (viewer, video) aggregates over the watch-record log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cr_core::{VideoId, ViewerId};
use serde::Serialize;

use crate::models::{progress_percent, WatchRecord};

/// Fraction of the duration a viewer must reach for a video to count as
/// completed.
const COMPLETION_RATIO: f64 = 0.95;

/// Viewing summary for one viewer and one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStat {
    pub viewer_id: ViewerId,
    pub video_id: VideoId,
    /// Number of sessions (watch records).
    pub view_count: u64,
    pub total_watched_time: u64,
    pub max_watched_time: u64,
    pub total_duration: u64,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub progress: u32,
    pub is_completed: bool,
}

impl ViewStat {
    fn empty(viewer_id: ViewerId, video_id: VideoId) -> Self {
        Self {
            viewer_id,
            video_id,
            view_count: 0,
            total_watched_time: 0,
            max_watched_time: 0,
            total_duration: 0,
            last_viewed_at: None,
            progress: 0,
            is_completed: false,
        }
    }

    fn absorb(&mut self, record: &WatchRecord) {
        self.view_count += 1;
        self.total_watched_time = self.total_watched_time.saturating_add(record.watched_time);
        self.max_watched_time = self.max_watched_time.max(record.watched_time);
        self.total_duration = self.total_duration.max(record.total_duration);
        if self.last_viewed_at.is_none_or(|t| record.viewed_at > t) {
            self.last_viewed_at = Some(record.viewed_at);
        }
    }

    fn finish(&mut self) {
        self.progress = progress_percent(self.max_watched_time, self.total_duration);
        self.is_completed = self.total_duration > 0
            && self.max_watched_time as f64 >= self.total_duration as f64 * COMPLETION_RATIO;
    }
}

/// Group records by (viewer, video), in order of each pair's first record.
pub fn aggregate(records: &[WatchRecord]) -> Vec<ViewStat> {
    let mut index: HashMap<(ViewerId, VideoId), usize> = HashMap::new();
    let mut stats: Vec<ViewStat> = Vec::new();

    for record in records {
        let key = (record.viewer_id, record.video_id);
        let slot = *index.entry(key).or_insert_with(|| {
            stats.push(ViewStat::empty(record.viewer_id, record.video_id));
            stats.len() - 1
        });
        stats[slot].absorb(record);
    }

    for stat in &mut stats {
        stat.finish();
    }
    stats
}
