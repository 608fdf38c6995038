//! Record types persisted in the JSON collections.
//!
//! Field names serialize in camelCase so the files stay readable by the
//! browser front-end that consumes the same shapes.

use chrono::{DateTime, Utc};
use cr_core::{CollectionId, VideoId, ViewerId, WatchRecordId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// Where a video's bytes are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "storageType",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum StorageDescriptor {
    /// A file under the upload directory, named by [`Video::stored_name`].
    #[default]
    Local,
    /// An object in the remote object store.
    Remote {
        #[serde(default)]
        object_key: Option<String>,
        #[serde(default)]
        bucket: String,
        #[serde(default)]
        region: String,
        /// Public base URL captured at upload time, if any.
        #[serde(default)]
        base_url: Option<String>,
    },
}

/// One uploaded video and its aggregate view counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub original_name: String,
    #[serde(default)]
    pub stored_name: Option<String>,
    pub mime_type: String,
    pub size: u64,
    pub upload_at: DateTime<Utc>,
    #[serde(default)]
    pub last_viewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub storage: StorageDescriptor,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
}

impl Video {
    /// Build a locally stored video with zeroed counters.
    pub fn new_local(
        original_name: impl Into<String>,
        stored_name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        grade: Option<String>,
    ) -> Self {
        Self {
            id: VideoId::new(),
            original_name: original_name.into(),
            stored_name: Some(stored_name.into()),
            mime_type: mime_type.into(),
            size,
            upload_at: Utc::now(),
            last_viewed_at: None,
            views: 0,
            storage: StorageDescriptor::Local,
            grade,
            collection_id: None,
        }
    }

    /// The grade tag, treating blank strings as untagged.
    pub fn grade_tag(&self) -> Option<&str> {
        self.grade.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.storage, StorageDescriptor::Remote { .. })
    }
}

// ---------------------------------------------------------------------------
// WatchRecord
// ---------------------------------------------------------------------------

/// Round a client-reported number of seconds to whole seconds.
///
/// Negative, NaN and infinite inputs become 0.
pub fn round_secs(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    secs.round() as u64
}

/// Percentage of `total` covered by `watched`, rounded; 0 when `total` is 0.
pub fn progress_percent(watched: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((watched as f64 / total as f64) * 100.0).round() as u32
}

/// Percentage from unrounded client seconds. Non-finite or non-positive
/// input yields 0.
fn progress_from_secs(watched: f64, total: f64) -> u32 {
    if !watched.is_finite() || !total.is_finite() || watched <= 0.0 || total <= 0.0 {
        return 0;
    }
    ((watched / total) * 100.0).round() as u32
}

/// One viewing session of one video by one viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    pub id: WatchRecordId,
    pub viewer_id: ViewerId,
    pub video_id: VideoId,
    /// Furthest playback position seen in this session, in seconds.
    pub watched_time: u64,
    pub total_duration: u64,
    pub progress: u32,
    /// Creation time of the session.
    pub viewed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl WatchRecord {
    /// Start a new session record.
    pub fn new(
        viewer_id: ViewerId,
        video_id: VideoId,
        watched_time: f64,
        total_duration: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WatchRecordId::new(),
            viewer_id,
            video_id,
            watched_time: round_secs(watched_time),
            total_duration: round_secs(total_duration),
            progress: progress_from_secs(watched_time, total_duration),
            viewed_at: now,
            last_updated_at: None,
        }
    }

    /// Fold a later observation into this session.
    ///
    /// Position and duration only move forward; progress is recomputed from
    /// the resulting pair.
    pub fn advance(&mut self, watched_time: f64, total_duration: f64, now: DateTime<Utc>) {
        self.watched_time = self.watched_time.max(round_secs(watched_time));
        self.total_duration = self.total_duration.max(round_secs(total_duration));
        self.progress = progress_percent(self.watched_time, self.total_duration);
        self.last_updated_at = Some(now);
    }
}
