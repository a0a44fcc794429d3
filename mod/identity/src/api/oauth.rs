//! Federated login endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use polls_core::{new_id, ServiceError};

use crate::api::{session_cookie, AppState, OAUTH_SESSION_COOKIE};
use crate::model::{CallbackParams, ProviderKind, RefreshRequest, TokenPair};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/oauth/{provider}/login", get(login))
        .route("/oauth/{provider}/callback", get(callback))
        .route("/oauth/token/refresh", post(refresh))
}

fn parse_provider(segment: &str) -> Result<ProviderKind, ServiceError> {
    ProviderKind::parse(segment)
        .ok_or_else(|| ServiceError::NotFound(format!("unknown provider '{}'", segment)))
}

/// Start a login: bind a session cookie, stash the nonce, redirect out.
async fn login(
    State(svc): State<AppState>,
    jar: CookieJar,
    Path(provider): Path<String>,
) -> Result<(CookieJar, Redirect), ServiceError> {
    let kind = parse_provider(&provider)?;

    let (jar, session_id) = match jar.get(OAUTH_SESSION_COOKIE) {
        Some(cookie) => {
            let id = cookie.value().to_string();
            (jar, id)
        }
        None => {
            let id = new_id();
            let max_age = svc.config().pending_login_ttl as i64;
            (jar.add(session_cookie(id.clone(), max_age)), id)
        }
    };

    let url = svc
        .begin_login(kind, &session_id)
        .map_err(ServiceError::from)?;
    Ok((jar, Redirect::temporary(&url)))
}

/// Provider callback: consume the nonce, exchange the code, mint tokens.
/// The session cookie is cleared on the way out; the attempt is over
/// whatever happened.
async fn callback(
    State(svc): State<AppState>,
    jar: CookieJar,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Json<TokenPair>), ServiceError> {
    let kind = parse_provider(&provider)?;

    let session_id = jar
        .get(OAUTH_SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ServiceError::Unauthorized("no pending login for this session".to_string()))?;

    let pair = svc
        .complete_login(kind, &session_id, &params)
        .await
        .map_err(ServiceError::from)?;

    let jar = jar.remove(Cookie::build(OAUTH_SESSION_COOKIE).path("/"));
    Ok((jar, Json(pair)))
}

async fn refresh(
    State(svc): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ServiceError> {
    let pair = svc
        .refresh_tokens(&req.refresh_token)
        .map_err(ServiceError::from)?;
    Ok(Json(pair))
}
