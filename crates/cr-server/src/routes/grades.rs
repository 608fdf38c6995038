//! Grade list route handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GradesBody {
    pub grades: Vec<String>,
}

/// GET /api/grades
#[utoipa::path(
    get,
    path = "/api/grades",
    responses((status = 200, description = "Current grade list", body = GradesBody))
)]
pub async fn get_grades(State(ctx): State<AppContext>) -> Result<Json<GradesBody>, AppError> {
    Ok(Json(GradesBody {
        grades: ctx.grades.read()?,
    }))
}

/// PUT /api/grades
///
/// Replace the grade list and drop the cached allowed set.
#[utoipa::path(
    put,
    path = "/api/grades",
    request_body = GradesBody,
    responses(
        (status = 200, description = "Grade list as stored", body = GradesBody),
        (status = 400, description = "Empty grade list"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn put_grades(
    State(ctx): State<AppContext>,
    Json(body): Json<GradesBody>,
) -> Result<Json<GradesBody>, AppError> {
    let grades = ctx.grades.write(&body.grades)?;
    ctx.grade_cache.invalidate();
    tracing::info!(count = grades.len(), "Grade list updated");
    Ok(Json(GradesBody { grades }))
}
