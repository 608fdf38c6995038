//! Public settings for the student player.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeInfo {
    pub name: String,
    pub requires_access_key: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    /// How often the player reports progress, in milliseconds.
    pub refresh_interval_ms: u64,
    pub allow_seek: bool,
    pub storage_driver: &'static str,
    pub grades: Vec<GradeInfo>,
}

/// GET /api/config
#[utoipa::path(
    get,
    path = "/api/config",
    responses((status = 200, description = "Player configuration", body = ClientConfigResponse))
)]
pub async fn client_config(
    State(ctx): State<AppContext>,
) -> Result<Json<ClientConfigResponse>, AppError> {
    let keys = &ctx.config.grades.access_tokens;
    let grades = ctx
        .grades
        .read()?
        .into_iter()
        .map(|name| GradeInfo {
            requires_access_key: keys.get(&name).is_some_and(|k| !k.is_empty()),
            name,
        })
        .collect();

    Ok(Json(ClientConfigResponse {
        refresh_interval_ms: ctx.config.playback.refresh_interval_ms,
        allow_seek: ctx.config.playback.allow_seek,
        storage_driver: ctx.config.storage.driver.as_str(),
        grades,
    }))
}
