//! Comment endpoints with guest ownership.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, patch, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use polls_core::ServiceError;

use crate::api::{bearer, guest_cookie, AppState, GUEST_TOKEN_COOKIE};
use crate::model::Comment;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(create))
        .route("/comments/{id}", patch(update))
        .route("/comments/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    question_id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    text: String,
}

fn guest_token(jar: &CookieJar) -> Option<String> {
    jar.get(GUEST_TOKEN_COOKIE).map(|c| c.value().to_string())
}

/// Create a comment. Bearer-authenticated callers go straight through;
/// everyone else is a guest and gets the ownership cookie back.
async fn create(
    State(svc): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, CookieJar, Json<Comment>), ServiceError> {
    if let Some(token) = bearer(&headers) {
        svc.verify_access(token).map_err(ServiceError::from)?;
        let comment = svc
            .create_comment(&req.question_id, &req.text)
            .map_err(ServiceError::from)?;
        return Ok((StatusCode::CREATED, jar, Json(comment)));
    }

    let token = guest_token(&jar);
    let (comment, token) = svc
        .create_guest_comment(token.as_deref(), &req.question_id, &req.text)
        .map_err(ServiceError::from)?;

    let jar = jar.add(guest_cookie(token, svc.config().guest_token_ttl));
    Ok((StatusCode::CREATED, jar, Json(comment)))
}

async fn update(
    State(svc): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Comment>, ServiceError> {
    let token = guest_token(&jar);
    let comment = svc
        .update_guest_comment(token.as_deref(), &id, &req.text)
        .map_err(ServiceError::from)?;
    Ok(Json(comment))
}

/// Delete an owned comment. The re-issued token (entry removed, expiry
/// preserved) goes back in the cookie.
async fn remove(
    State(svc): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<(StatusCode, CookieJar), ServiceError> {
    let token = guest_token(&jar);
    let token = svc
        .delete_guest_comment(token.as_deref(), &id)
        .map_err(ServiceError::from)?;

    let jar = jar.add(guest_cookie(token, svc.config().guest_token_ttl));
    Ok((StatusCode::NO_CONTENT, jar))
}
