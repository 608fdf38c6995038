//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`cr_core::Error`] so that route handlers
//! can return `Result<T, AppError>` and use `?` on store calls directly.
//! The JSON body also rides along as an [`ErrorBody`] response extension;
//! the request-id middleware uses it to stamp `request_id` into the body.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(cr_core::Error);

impl From<cr_core::Error> for AppError {
    fn from(e: cr_core::Error) -> Self {
        Self(e)
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    pub request_id: Option<String>,
}

impl ErrorBody {
    /// Rewrite `response` so its body carries `request_id`. Responses that
    /// are not API errors pass through untouched.
    pub fn stamp_request_id(response: &mut Response, request_id: &str) {
        let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
            return;
        };
        body.request_id = Some(request_id.to_string());
        match serde_json::to_vec(&body) {
            Ok(bytes) => {
                response.headers_mut().remove(header::CONTENT_LENGTH);
                *response.body_mut() = axum::body::Body::from(bytes);
            }
            Err(e) => tracing::warn!("Failed to re-encode error body: {e}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.0,
                "Server error in API handler"
            );
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code(),
            request_id: None,
        };

        let mut response = (status, axum::Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn not_found_produces_404() {
        let err = AppError::from(cr_core::Error::not_found("video", "abc"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn gone_produces_410() {
        let err = AppError::from(cr_core::Error::Gone("video file missing".into()));
        assert_eq!(err.into_response().status(), StatusCode::GONE);
    }

    #[test]
    fn store_failure_produces_500() {
        let err = AppError::from(cr_core::Error::store("disk on fire"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn stamping_fills_request_id() {
        let mut response = AppError::from(cr_core::Error::Internal("oops".into())).into_response();
        ErrorBody::stamp_request_id(&mut response, "req-123");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json(response).await;
        assert_eq!(body["request_id"], "req-123");
        assert_eq!(body["code"], "internal_error");
    }

    #[tokio::test]
    async fn stamping_ignores_non_error_responses() {
        let mut response = "fine".into_response();
        ErrorBody::stamp_request_id(&mut response, "req-123");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"fine");
    }
}
