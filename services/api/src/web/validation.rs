//! services/api/src/web/validation.rs
//!
//! Shape and length checks that turn request payloads into domain inputs.
//! The store performs no validation of its own, so everything it receives passes through here.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use qa_community_core::domain::{
    NewAnswer, NewQuestion, NewUser, QuestionId, TargetType, UserId, VoteDirection, VoteTarget,
};
use qa_community_core::ports::Page;
use tracing::warn;

use crate::error::ApiError;
use crate::web::payloads::{
    CastVoteRequest, CreateAnswerRequest, CreateQuestionRequest, RegisterUserRequest,
};

pub const MIN_TITLE_CHARS: usize = 10;
pub const MIN_QUESTION_BODY_CHARS: usize = 20;
pub const MIN_ANSWER_CHARS: usize = 10;
pub const MAX_TAGS: usize = 5;
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_POPULAR_TAGS: usize = 10;

fn reject(message: String) -> ApiError {
    warn!("Rejected request: {}", message);
    ApiError::Validation(message)
}

/// Unwraps a JSON body, reporting malformed payloads as validation errors.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| reject(rejection.body_text()))
}

/// Unwraps path parameters, reporting unparsable ids as validation errors.
pub fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path
        .map(|Path(value)| value)
        .map_err(|rejection| reject(rejection.body_text()))
}

/// Unwraps a query string, reporting malformed parameters as validation errors.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| reject(rejection.body_text()))
}

fn require_min_chars(field: &str, value: &str, min: usize) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < min {
        return Err(reject(format!(
            "{} must be at least {} characters long",
            field, min
        )));
    }
    Ok(trimmed.to_string())
}

pub fn new_question(
    req: CreateQuestionRequest,
    author_id: UserId,
) -> Result<NewQuestion, ApiError> {
    let title = require_min_chars("Title", &req.title, MIN_TITLE_CHARS)?;
    let content = require_min_chars("Question details", &req.content, MIN_QUESTION_BODY_CHARS)?;

    let tags: Vec<String> = req
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tags.is_empty() {
        return Err(reject("At least one tag is required".to_string()));
    }
    if tags.len() > MAX_TAGS {
        return Err(reject(format!("Maximum {} tags allowed", MAX_TAGS)));
    }

    Ok(NewQuestion {
        title,
        content,
        tags,
        author_id,
    })
}

pub fn new_answer(
    question_id: QuestionId,
    req: CreateAnswerRequest,
    author_id: UserId,
) -> Result<NewAnswer, ApiError> {
    Ok(NewAnswer {
        question_id,
        content: require_min_chars("Answer", &req.content, MIN_ANSWER_CHARS)?,
        author_id,
    })
}

pub fn vote(req: &CastVoteRequest) -> Result<(VoteTarget, VoteDirection), ApiError> {
    let kind = req
        .target_type
        .parse::<TargetType>()
        .map_err(|e| reject(e.to_string()))?;
    let direction = req
        .vote_type
        .parse::<VoteDirection>()
        .map_err(|e| reject(e.to_string()))?;
    if req.target_id < 1 {
        return Err(reject(format!("{} is not a valid target id", req.target_id)));
    }
    Ok((
        VoteTarget {
            id: req.target_id,
            kind,
        },
        direction,
    ))
}

pub fn new_user(req: RegisterUserRequest) -> Result<NewUser, ApiError> {
    let username = require_min_chars("Username", &req.username, 3)?;
    let email = req.email.trim().to_string();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(reject("Please enter a valid email".to_string()));
    }
    Ok(NewUser { username, email })
}

/// Offset/limit with the default page size, capped at `MAX_PAGE_SIZE`.
/// The offset never exceeds what a SQL `OFFSET` (a signed 64-bit value) can hold.
pub fn page(limit: Option<usize>, offset: Option<usize>) -> Page {
    Page::new(
        limit.unwrap_or(Page::DEFAULT_LIMIT).min(MAX_PAGE_SIZE),
        offset.unwrap_or(0).min(i64::MAX as usize),
    )
}
