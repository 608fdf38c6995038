//! Video catalog route handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use cr_core::VideoId;
use cr_store::models::{StorageDescriptor, Video};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::parse_id;

// ---------------------------------------------------------------------------
// Request / response schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListVideosParams {
    /// Only return videos tagged with this grade.
    pub grade: Option<String>,
}

/// A video as returned to clients, with the path to stream it from.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    #[schema(value_type = String)]
    pub upload_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub views: u64,
    /// `local` or `remote`.
    pub storage_type: &'static str,
    pub grade: Option<String>,
    pub collection_id: Option<String>,
    pub stream_path: String,
}

impl VideoResponse {
    pub fn from_model(video: &Video) -> Self {
        let grade = video.grade_tag().map(String::from);
        let stream_path = match &grade {
            Some(g) => format!(
                "/api/videos/{}/stream?grade={}",
                video.id,
                urlencoding::encode(g)
            ),
            None => format!("/api/videos/{}/stream", video.id),
        };
        let storage_type = match video.storage {
            StorageDescriptor::Local => "local",
            StorageDescriptor::Remote { .. } => "remote",
        };

        Self {
            id: video.id.to_string(),
            original_name: video.original_name.clone(),
            mime_type: video.mime_type.clone(),
            size: video.size,
            upload_at: video.upload_at,
            last_viewed_at: video.last_viewed_at,
            views: video.views,
            storage_type,
            grade,
            collection_id: video.collection_id.map(|c| c.to_string()),
            stream_path,
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// GET /api/videos
#[utoipa::path(
    get,
    path = "/api/videos",
    params(ListVideosParams),
    responses((status = 200, description = "Videos in upload order", body = Vec<VideoResponse>))
)]
pub async fn list_videos(
    State(ctx): State<AppContext>,
    Query(params): Query<ListVideosParams>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let filter = params
        .grade
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());

    let videos = ctx
        .videos
        .list()?
        .iter()
        .filter(|v| filter.is_none_or(|g| v.grade_tag() == Some(g)))
        .map(VideoResponse::from_model)
        .collect();

    Ok(Json(videos))
}

/// GET /api/videos/{id}
#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "The video", body = VideoResponse),
        (status = 404, description = "Unknown video")
    )
)]
pub async fn get_video(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let id: VideoId = parse_id(&id, "video")?;
    let video = ctx.require_video(id)?;
    Ok(Json(VideoResponse::from_model(&video)))
}
