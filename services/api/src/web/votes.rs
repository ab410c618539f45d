//! services/api/src/web/votes.rs
//!
//! The vote endpoint. A repeated vote in the same direction withdraws it, a vote in
//! the other direction replaces it.

use crate::error::{ApiError, ErrorBody};
use crate::web::payloads::{CastVoteRequest, VoteCastResponse};
use crate::web::state::{AppState, Caller};
use crate::web::validation;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use qa_community_core::domain::VoteOutcome;
use std::sync::Arc;
use tracing::info;

/// Cast, switch or withdraw the calling user's vote on a question or answer.
#[utoipa::path(
    post,
    path = "/api/votes",
    request_body = CastVoteRequest,
    params(
        ("x-user-id" = Option<i64>, Header, description = "Acting user, demo user if omitted.")
    ),
    responses(
        (status = 201, description = "Vote recorded or changed", body = VoteCastResponse),
        (status = 200, description = "Vote withdrawn", body = VoteCastResponse),
        (status = 400, description = "Invalid vote data", body = ErrorBody),
        (status = 404, description = "No such question or answer", body = ErrorBody)
    )
)]
pub async fn cast_vote_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CastVoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let (target, direction) = validation::vote(&validation::json_body(payload)?)?;
    let receipt = app_state
        .store
        .cast_vote(caller.user_id, target, direction)
        .await?;

    info!(
        user_id = caller.user_id,
        %target,
        outcome = ?receipt.outcome,
        total = receipt.target.votes(),
        "vote cast"
    );
    let status = match receipt.outcome {
        VoteOutcome::Removed => StatusCode::OK,
        VoteOutcome::Created | VoteOutcome::Switched => StatusCode::CREATED,
    };
    Ok((status, Json(VoteCastResponse::from(receipt))))
}
