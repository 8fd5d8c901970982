//! Authentication middleware: bearer extraction and identity attachment.
//!
//! The credential travels in the `Authorization: Bearer <token>` header,
//! with a `token` cookie as fallback for browser sessions. The header
//! wins when both are present. All authorization decisions are delegated
//! to [`AccessControl`]; this layer only moves the credential and the
//! resolved [`Identity`] around.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use platform_core::error::AppError;

use crate::models::{Identity, Role};
use crate::services::AccessControl;

pub const TOKEN_COOKIE: &str = "token";

/// Pull the bearer credential out of the request, header first.
fn bearer_credential(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    from_header.or_else(|| {
        CookieJar::from_headers(headers)
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

/// Require an authenticated, active account.
pub async fn auth_middleware(
    State(access): State<AccessControl>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = bearer_credential(req.headers());
    let identity = access.resolve_identity(credential.as_deref()).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Require an admin-tier caller. Must run after `auth_middleware`.
pub async fn admin_middleware(
    State(access): State<AccessControl>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<Identity>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "admin_middleware ran without auth_middleware"
        ))
    })?;

    access.require_role(identity, &Role::ADMIN_TIER)?;
    Ok(next.run(req).await)
}

/// Attach an identity when the caller presents a usable credential, and
/// proceed anonymously otherwise. Never rejects.
pub async fn optional_auth_middleware(
    State(access): State<AccessControl>,
    mut req: Request,
    next: Next,
) -> Response {
    let credential = bearer_credential(req.headers());
    if let Some(identity) = access.optional_identity(credential.as_deref()).await {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}

/// Extractor for handlers behind `auth_middleware`.
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Identity missing from request extensions"))
        })?;
        Ok(AuthUser(identity))
    }
}

/// Extractor for handlers behind `optional_auth_middleware`.
pub struct MaybeUser(pub Option<Identity>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Identity>().cloned()))
    }
}
