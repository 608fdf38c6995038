//! Admin view statistics.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use cr_core::{VideoId, ViewerId};
use cr_store::models::{Video, WatchRecord};
use cr_store::queries::stats::{self, ViewStat};
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::parse_id;

// ---------------------------------------------------------------------------
// Response schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub original_name: String,
    pub grade: Option<String>,
}

impl VideoSummary {
    fn from_model(video: &Video) -> Self {
        Self {
            id: video.id.to_string(),
            original_name: video.original_name.clone(),
            grade: video.grade_tag().map(String::from),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatEntry {
    pub viewer_id: String,
    pub video_id: String,
    pub view_count: u64,
    pub total_watched_time: u64,
    pub max_watched_time: u64,
    pub total_duration: u64,
    #[schema(value_type = Option<String>)]
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub progress: u32,
    pub is_completed: bool,
    /// `None` when the video has since disappeared from the catalog.
    pub video: Option<VideoSummary>,
}

impl ViewStatEntry {
    fn new(stat: ViewStat, video: Option<VideoSummary>) -> Self {
        Self {
            viewer_id: stat.viewer_id.to_string(),
            video_id: stat.video_id.to_string(),
            view_count: stat.view_count,
            total_watched_time: stat.total_watched_time,
            max_watched_time: stat.max_watched_time,
            total_duration: stat.total_duration,
            last_viewed_at: stat.last_viewed_at,
            progress: stat.progress,
            is_completed: stat.is_completed,
            video,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ViewStatsResponse {
    pub statistics: Vec<ViewStatEntry>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecordEntry {
    pub id: String,
    pub viewer_id: String,
    pub video_id: String,
    pub watched_time: u64,
    pub total_duration: u64,
    pub progress: u32,
    #[schema(value_type = String)]
    pub viewed_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSummary>,
}

impl WatchRecordEntry {
    fn new(record: &WatchRecord, video: Option<VideoSummary>) -> Self {
        Self {
            id: record.id.to_string(),
            viewer_id: record.viewer_id.to_string(),
            video_id: record.video_id.to_string(),
            watched_time: record.watched_time,
            total_duration: record.total_duration,
            progress: record.progress,
            viewed_at: record.viewed_at,
            last_updated_at: record.last_updated_at,
            video,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewerRecordsResponse {
    pub viewer_id: String,
    pub records: Vec<WatchRecordEntry>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoRecordsResponse {
    pub video: Option<VideoSummary>,
    pub records: Vec<WatchRecordEntry>,
}

/// Summaries of every catalog video, keyed by id.
fn video_index(ctx: &AppContext) -> cr_core::Result<HashMap<VideoId, VideoSummary>> {
    Ok(ctx
        .videos
        .list()?
        .iter()
        .map(|v| (v.id, VideoSummary::from_model(v)))
        .collect())
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// GET /api/view-stats
#[utoipa::path(
    get,
    path = "/api/view-stats",
    responses(
        (status = 200, description = "Per viewer and video aggregates", body = ViewStatsResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_view_stats(
    State(ctx): State<AppContext>,
) -> Result<Json<ViewStatsResponse>, AppError> {
    let records = ctx.watch_records.all()?;
    let videos = video_index(&ctx)?;

    let statistics = stats::aggregate(&records)
        .into_iter()
        .map(|stat| {
            let video = videos.get(&stat.video_id).cloned();
            ViewStatEntry::new(stat, video)
        })
        .collect();

    Ok(Json(ViewStatsResponse { statistics }))
}

/// GET /api/view-stats/by-viewer/{id}
#[utoipa::path(
    get,
    path = "/api/view-stats/by-viewer/{id}",
    params(("id" = String, Path, description = "Viewer ID")),
    responses(
        (status = 200, description = "The viewer's sessions", body = ViewerRecordsResponse),
        (status = 404, description = "Malformed viewer id")
    )
)]
pub async fn viewer_records(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ViewerRecordsResponse>, AppError> {
    let viewer_id: ViewerId = parse_id(&id, "viewer")?;
    let videos = video_index(&ctx)?;

    let records = ctx
        .watch_records
        .find_by_viewer(viewer_id)?
        .iter()
        .map(|r| WatchRecordEntry::new(r, videos.get(&r.video_id).cloned()))
        .collect();

    Ok(Json(ViewerRecordsResponse {
        viewer_id: viewer_id.to_string(),
        records,
    }))
}

/// GET /api/view-stats/by-video/{id}
#[utoipa::path(
    get,
    path = "/api/view-stats/by-video/{id}",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Sessions for the video", body = VideoRecordsResponse),
        (status = 404, description = "Malformed video id")
    )
)]
pub async fn video_records(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<VideoRecordsResponse>, AppError> {
    let video_id: VideoId = parse_id(&id, "video")?;
    let video = ctx.videos.get(video_id)?.as_ref().map(VideoSummary::from_model);

    let records = ctx
        .watch_records
        .find_by_video(video_id)?
        .iter()
        .map(|r| WatchRecordEntry::new(r, None))
        .collect();

    Ok(Json(VideoRecordsResponse { video, records }))
}
