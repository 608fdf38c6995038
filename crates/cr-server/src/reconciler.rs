//! View-event reconciliation.
//!
//! A playback event either continues the viewer's latest session, starts a
//! new one, or (for anonymous callers) only bumps the aggregate counter.
//! [`decide`] picks the branch without touching storage; [`apply`] performs
//! it against the catalog and the watch-record log.

use cr_core::{Error, Result, VideoId, ViewerId, WatchRecordId};
use cr_store::models::{Video, WatchRecord};
use cr_store::queries::videos::VideoCatalog;
use cr_store::queries::watch_records::WatchRecordLog;
use serde::Deserialize;

/// A backward jump larger than this many seconds is treated as a restart.
pub const RESTART_THRESHOLD_SECS: f64 = 10.0;

/// One playback event as reported by the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewEvent {
    /// Current playback position in seconds.
    pub watched_time: f64,
    /// Media duration in seconds, if known.
    pub total_duration: f64,
    /// Set by the player when playback starts from the beginning.
    pub is_new_view: bool,
}

/// What to do with a view event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDecision {
    /// Start a new session and count a view.
    NewRecord,
    /// Advance the given session in place without counting.
    UpdateRecord { record_id: WatchRecordId },
    /// No viewer: count a view, keep no session.
    AnonymousIncrement,
}

impl ViewDecision {
    pub fn counts_view(&self) -> bool {
        !matches!(self, ViewDecision::UpdateRecord { .. })
    }
}

/// Decide how to handle `event` given the viewer's latest session for the
/// video.
pub fn decide(
    viewer: Option<ViewerId>,
    latest: Option<&WatchRecord>,
    event: &ViewEvent,
) -> ViewDecision {
    if viewer.is_none() {
        return ViewDecision::AnonymousIncrement;
    }
    let Some(latest) = latest else {
        return ViewDecision::NewRecord;
    };

    let delta = event.watched_time - latest.watched_time as f64;
    if event.is_new_view || delta < -RESTART_THRESHOLD_SECS {
        ViewDecision::NewRecord
    } else {
        ViewDecision::UpdateRecord {
            record_id: latest.id,
        }
    }
}

/// Outcome of [`apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub decision: ViewDecision,
    pub video: Video,
    /// The session created or updated, if any.
    pub record: Option<WatchRecord>,
}

/// Reconcile `event` for `video_id` and return the video aggregate after
/// the change.
///
/// The session write happens before the counter update, so a store failure
/// never leaves a counted view without its record.
pub fn apply(
    videos: &dyn VideoCatalog,
    records: &dyn WatchRecordLog,
    video_id: VideoId,
    viewer: Option<ViewerId>,
    event: &ViewEvent,
) -> Result<Reconciled> {
    let latest = match viewer {
        Some(viewer_id) => records.find_by_viewer_and_video(viewer_id, video_id)?.pop(),
        None => None,
    };
    let decision = decide(viewer, latest.as_ref(), event);

    let record = match (decision, viewer) {
        (ViewDecision::NewRecord, Some(viewer_id)) => Some(records.create_record(
            viewer_id,
            video_id,
            event.watched_time,
            event.total_duration,
        )?),
        (ViewDecision::UpdateRecord { record_id }, _) => {
            records.update_record(record_id, event.watched_time, event.total_duration)?
        }
        _ => None,
    };

    let video = if decision.counts_view() {
        videos.increment_view_counter(video_id)?
    } else {
        videos.touch_last_viewed(video_id)?
    }
    .ok_or_else(|| Error::not_found("video", video_id))?;

    tracing::debug!(
        video_id = %video_id,
        viewer = ?viewer,
        decision = ?decision,
        views = video.views,
        "View event reconciled"
    );

    Ok(Reconciled {
        decision,
        video,
        record,
    })
}
