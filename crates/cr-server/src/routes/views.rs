//! View-event route handler.

use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use cr_core::VideoId;

use crate::access::AccessParams;
use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::Viewer;
use crate::reconciler::{self, ViewEvent};
use crate::routes::parse_id;
use crate::routes::videos::VideoResponse;

/// Decode the event body. An empty body is an event with all defaults.
fn parse_event(body: &[u8]) -> cr_core::Result<ViewEvent> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ViewEvent::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| cr_core::Error::Validation(format!("invalid view event: {e}")))
}

/// POST /api/videos/{id}/view
///
/// Record a playback event. Students with a valid token get per-session
/// watch records; everyone else just bumps the view counter.
#[utoipa::path(
    post,
    path = "/api/videos/{id}/view",
    params(("id" = String, Path, description = "Video ID"), AccessParams),
    request_body(content = ViewEvent, description = "Playback event; may be empty"),
    responses(
        (status = 200, description = "Video after the event", body = VideoResponse),
        (status = 400, description = "Grade parameter missing or body malformed"),
        (status = 403, description = "Grade or access key rejected"),
        (status = 404, description = "Unknown video")
    )
)]
pub async fn record_view(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(params): Query<AccessParams>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<VideoResponse>, AppError> {
    let id: VideoId = parse_id(&id, "video")?;
    let video = ctx.require_video(id)?;
    ctx.check_access(&video, &params, &headers)?;
    let event = parse_event(&body)?;

    let outcome = reconciler::apply(
        ctx.videos.as_ref(),
        ctx.watch_records.as_ref(),
        id,
        viewer.0,
        &event,
    )?;

    Ok(Json(VideoResponse::from_model(&outcome.video)))
}
