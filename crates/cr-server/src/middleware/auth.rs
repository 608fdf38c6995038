//! Viewer identity and admin authentication.
//!
//! Tokens are `<payload>.<signature>` where the payload is base64url JSON
//! [`Claims`] and the signature is the hex HMAC-SHA256 of the encoded payload
//! under `auth.token_secret`.
//!
//! Two middlewares consume them:
//!
//! - [`viewer_middleware`] never rejects. It inserts a [`Viewer`] that is
//!   anonymous unless a valid, unexpired student token is presented.
//! - [`admin_middleware`] rejects with 401 for a missing or invalid token and
//!   403 for a valid token whose role is not `admin`.

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use cr_core::config::AuthConfig;
use cr_core::ViewerId;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::context::AppContext;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// What a token holder may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = cr_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(cr_core::Error::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: a viewer id for students, free-form for admins.
    pub sub: String,
    pub role: Role,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

/// Identity attached to a view event. `None` means anonymous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer(pub Option<ViewerId>);

fn sign(secret: &str, payload: &str) -> cr_core::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| cr_core::Error::Internal(format!("invalid token secret: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Issue a token for `sub` valid for `ttl` from `now`.
pub fn issue_token(
    secret: &str,
    sub: &str,
    role: Role,
    ttl: Duration,
    now: DateTime<Utc>,
) -> cr_core::Result<String> {
    let claims = Claims {
        sub: sub.to_string(),
        role,
        exp: (now + ttl).timestamp(),
    };
    let json = serde_json::to_vec(&claims)
        .map_err(|e| cr_core::Error::Internal(format!("failed to encode claims: {e}")))?;
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = sign(secret, &payload)?;
    Ok(format!("{payload}.{signature}"))
}

/// Verify `token` and return its claims if the signature matches and it has
/// not expired at `now`.
pub fn verify_token(secret: &str, token: &str, now: DateTime<Utc>) -> Option<Claims> {
    let (payload, signature) = token.split_once('.')?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::decode(signature).ok()?;
    mac.verify_slice(&expected).ok()?;

    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&json).ok()?;
    if claims.exp <= now.timestamp() {
        return None;
    }
    Some(claims)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the claims carried by `headers`, if any are valid.
pub fn resolve_claims(auth: &AuthConfig, headers: &HeaderMap) -> Option<Claims> {
    let secret = auth.token_secret.as_deref()?;
    verify_token(secret, bearer_token(headers)?, Utc::now())
}

/// Resolve the viewer behind a view event.
///
/// Anything other than a valid student token whose subject is a viewer id
/// is anonymous.
pub fn resolve_viewer(auth: &AuthConfig, headers: &HeaderMap) -> Viewer {
    let viewer = resolve_claims(auth, headers)
        .filter(|c| c.role == Role::Student)
        .and_then(|c| c.sub.parse::<ViewerId>().ok());
    Viewer(viewer)
}

/// Attach a [`Viewer`] to every request. Never rejects.
pub async fn viewer_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let viewer = resolve_viewer(&ctx.config.auth, request.headers());
    if viewer.0.is_none() && bearer_token(request.headers()).is_some() {
        tracing::debug!("Bearer token did not resolve to a viewer; treating as anonymous");
    }
    request.extensions_mut().insert(viewer);
    next.run(request).await
}

/// Require a valid admin token. Inserts the [`Claims`] on success.
pub async fn admin_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = resolve_claims(&ctx.config.auth, request.headers()).ok_or_else(|| {
        cr_core::Error::Unauthorized("a valid admin token is required".into())
    })?;
    if claims.role != Role::Admin {
        return Err(cr_core::Error::Forbidden("admin role required".into()).into());
    }
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
