//! Vote endpoint.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use polls_core::ServiceError;

use crate::api::{bearer, voted_cookie, AppState, VOTED_ANSWERS_COOKIE};
use crate::service::vote::{format_voted_cookie, parse_voted_cookie};

pub fn routes() -> Router<AppState> {
    Router::new().route("/answers/{id}/vote", post(vote))
}

#[derive(Debug, Serialize)]
struct VoteResponse {
    votes: i64,
}

/// Cast a vote. Authenticated callers get durable dedup keyed by account;
/// guests get best-effort dedup through the vote-history cookie.
async fn vote(
    State(svc): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(answer_id): Path<String>,
) -> Result<(CookieJar, Json<VoteResponse>), ServiceError> {
    if let Some(token) = bearer(&headers) {
        let claims = svc.verify_access(token).map_err(ServiceError::from)?;
        let votes = svc
            .vote_as_account(&claims.sub, &answer_id)
            .map_err(ServiceError::from)?;
        return Ok((jar, Json(VoteResponse { votes })));
    }

    let voted = parse_voted_cookie(jar.get(VOTED_ANSWERS_COOKIE).map(|c| c.value()));
    let (votes, voted) = svc
        .vote_as_guest(&answer_id, &voted)
        .map_err(ServiceError::from)?;

    let jar = jar.add(voted_cookie(
        format_voted_cookie(&voted),
        svc.config().vote_cookie_max_age,
    ));
    Ok((jar, Json(VoteResponse { votes })))
}
