//! Axum router construction.
//!
//! Builds the full application router with route groups, middleware layers,
//! the OpenAPI document and optional static file serving.

use std::path::PathBuf;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::auth::{admin_middleware, viewer_middleware};
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::client_config::client_config,
        routes::videos::list_videos,
        routes::videos::get_video,
        routes::stream::stream_video,
        routes::views::record_view,
        routes::grades::get_grades,
        routes::grades::put_grades,
        routes::view_stats::list_view_stats,
        routes::view_stats::viewer_records,
        routes::view_stats::video_records,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::client_config::ClientConfigResponse,
        routes::client_config::GradeInfo,
        routes::videos::VideoResponse,
        routes::grades::GradesBody,
        routes::view_stats::ViewStatsResponse,
        routes::view_stats::ViewStatEntry,
        routes::view_stats::VideoSummary,
        routes::view_stats::WatchRecordEntry,
        routes::view_stats::ViewerRecordsResponse,
        routes::view_stats::VideoRecordsResponse,
        crate::reconciler::ViewEvent,
    ))
)]
pub struct ApiDoc;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = cors_layer(&ctx.config.server.cors_origins);
    let admin = middleware::from_fn_with_state(ctx.clone(), admin_middleware);

    let api = Router::new()
        .route("/config", get(routes::client_config::client_config))
        .route("/videos", get(routes::videos::list_videos))
        .route("/videos/{id}", get(routes::videos::get_video))
        .route("/videos/{id}/stream", get(routes::stream::stream_video))
        .route(
            "/videos/{id}/view",
            post(routes::views::record_view)
                .route_layer(middleware::from_fn_with_state(ctx.clone(), viewer_middleware)),
        )
        .route(
            "/grades",
            get(routes::grades::get_grades)
                .merge(put(routes::grades::put_grades).route_layer(admin.clone())),
        );

    let admin_routes = Router::new()
        .route("/view-stats", get(routes::view_stats::list_view_stats))
        .route(
            "/view-stats/by-viewer/{id}",
            get(routes::view_stats::viewer_records),
        )
        .route(
            "/view-stats/by-video/{id}",
            get(routes::view_stats::video_records),
        )
        .route_layer(admin);

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api.merge(admin_routes))
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {}", dir.display());
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                tower_http::services::ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(tower_http::services::ServeFile::new(index_path)),
            );
        } else {
            tracing::warn!("Static directory {} does not exist; not serving it", dir.display());
        }
    }

    app
}
