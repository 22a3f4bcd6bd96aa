//! Session gate for the lead endpoints.
//!
//! Tokens are HS256 JWTs signed with `JWT_SECRET`. The browser client sends
//! them in the httpOnly `token` cookie; API clients may use
//! `Authorization: Bearer <token>` instead. The cookie wins when both are set.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::MessageResponse;

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user.
    pub sub: Uuid,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
}

/// Signs a session token for `subject` valid for `ttl`.
pub fn issue_token(secret: &str, subject: Uuid, ttl: Duration) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject,
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Failed to sign token: {}", e)))
}

/// Verifies signature and expiry.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects the request with 401 unless it carries a valid session token.
///
/// On success the decoded [`Claims`] are stored in the request extensions
/// for [`AuthenticatedUser`].
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match jar.get(TOKEN_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => bearer_token(&request)
            .map(str::to_string)
            .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?,
    };

    let claims = decode_token(&state.config.jwt_secret, &token)?;
    tracing::debug!("Authenticated request for user {}", claims.sub);

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Claims of the caller, available behind [`require_auth`].
pub struct AuthenticatedUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Unauthorized("No session".to_string()))
    }
}

/// Session summary returned by `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// GET /api/auth/me
///
/// # Returns
///
/// * `Result<Json<MeResponse>, AppError>` - The caller's identity and token expiry.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current session", body = MeResponse),
        (status = 401, description = "Not authorized")
    ),
    security(("api_jwt" = [])),
    tag = "Auth"
)]
pub async fn me(AuthenticatedUser(claims): AuthenticatedUser) -> Result<Json<MeResponse>, AppError> {
    let expires_at = DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AppError::Unauthorized("Token expiry out of range".to_string()))?;

    Ok(Json(MeResponse {
        id: claims.sub,
        expires_at,
    }))
}

/// POST /api/auth/logout
///
/// Clears the session cookie. Always succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cookie cleared", body = MessageResponse)),
    tag = "Auth"
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (jar, Json(MessageResponse::new("Logged out successfully")))
}
