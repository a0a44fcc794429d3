//! HTTP surface.
//!
//! Each API area gets its own router and explicit per-route handlers.
//! Handlers convert [`IdentityError`](crate::service::IdentityError) into
//! the shared [`ServiceError`](polls_core::ServiceError) envelope at the
//! boundary.

pub mod comments;
pub mod oauth;
pub mod votes;

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use axum::Router;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::service::IdentityService;

pub type AppState = Arc<IdentityService>;

/// Opaque session id binding a login attempt to one user agent.
pub const OAUTH_SESSION_COOKIE: &str = "oauth_session";
/// Signed guest ownership token.
pub const GUEST_TOKEN_COOKIE: &str = "anonymous_user_token";
/// Plain comma-separated answer ids the browser has voted on.
pub const VOTED_ANSWERS_COOKIE: &str = "voted_answers";

pub fn build_router(svc: AppState) -> Router {
    Router::new()
        .merge(oauth::routes())
        .merge(comments::routes())
        .merge(votes::routes())
        .with_state(svc)
}

/// Extract a bearer token from the Authorization header, if present.
pub(crate) fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub(crate) fn guest_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((GUEST_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

pub(crate) fn session_cookie(id: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((OAUTH_SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Vote-history cookie. Unsigned but httponly; the server never trusts
/// it beyond best-effort dedup.
pub(crate) fn voted_cookie(value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((VOTED_ANSWERS_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}
