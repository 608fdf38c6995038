//! Watch-record log operations.

use std::path::Path;

use chrono::Utc;
use cr_core::{Result, VideoId, ViewerId, WatchRecordId};

use crate::collection::JsonCollection;
use crate::models::WatchRecord;

/// File name of the log inside the data directory.
pub const WATCH_RECORDS_FILE: &str = "viewRecords.json";

/// Append-and-update log of viewing sessions.
///
/// Lookups return records in creation order, so the last element of
/// [`WatchRecordLog::find_by_viewer_and_video`] is the latest session.
pub trait WatchRecordLog: Send + Sync {
    fn find_by_viewer_and_video(
        &self,
        viewer_id: ViewerId,
        video_id: VideoId,
    ) -> Result<Vec<WatchRecord>>;

    fn find_by_viewer(&self, viewer_id: ViewerId) -> Result<Vec<WatchRecord>>;

    fn find_by_video(&self, video_id: VideoId) -> Result<Vec<WatchRecord>>;

    fn all(&self) -> Result<Vec<WatchRecord>>;

    fn create_record(
        &self,
        viewer_id: ViewerId,
        video_id: VideoId,
        watched_time: f64,
        total_duration: f64,
    ) -> Result<WatchRecord>;

    /// Advance an existing session; `None` when the record is unknown.
    fn update_record(
        &self,
        record_id: WatchRecordId,
        watched_time: f64,
        total_duration: f64,
    ) -> Result<Option<WatchRecord>>;
}

/// [`WatchRecordLog`] backed by `viewRecords.json`.
#[derive(Debug, Clone)]
pub struct JsonWatchRecords {
    collection: JsonCollection<WatchRecord>,
}

impl JsonWatchRecords {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            collection: JsonCollection::open(data_dir.join(WATCH_RECORDS_FILE)),
        }
    }

    fn filtered(&self, pred: impl Fn(&WatchRecord) -> bool) -> Result<Vec<WatchRecord>> {
        let mut records = self.collection.read_all()?;
        records.retain(|r| pred(r));
        Ok(records)
    }
}

impl WatchRecordLog for JsonWatchRecords {
    fn find_by_viewer_and_video(
        &self,
        viewer_id: ViewerId,
        video_id: VideoId,
    ) -> Result<Vec<WatchRecord>> {
        self.filtered(|r| r.viewer_id == viewer_id && r.video_id == video_id)
    }

    fn find_by_viewer(&self, viewer_id: ViewerId) -> Result<Vec<WatchRecord>> {
        self.filtered(|r| r.viewer_id == viewer_id)
    }

    fn find_by_video(&self, video_id: VideoId) -> Result<Vec<WatchRecord>> {
        self.filtered(|r| r.video_id == video_id)
    }

    fn all(&self) -> Result<Vec<WatchRecord>> {
        self.collection.read_all()
    }

    fn create_record(
        &self,
        viewer_id: ViewerId,
        video_id: VideoId,
        watched_time: f64,
        total_duration: f64,
    ) -> Result<WatchRecord> {
        let record = WatchRecord::new(viewer_id, video_id, watched_time, total_duration, Utc::now());
        self.collection.update(|records| {
            records.push(record.clone());
            Ok(())
        })?;
        Ok(record)
    }

    fn update_record(
        &self,
        record_id: WatchRecordId,
        watched_time: f64,
        total_duration: f64,
    ) -> Result<Option<WatchRecord>> {
        self.collection.update(|records| {
            Ok(records.iter_mut().find(|r| r.id == record_id).map(|record| {
                record.advance(watched_time, total_duration, Utc::now());
                record.clone()
            }))
        })
    }
}
