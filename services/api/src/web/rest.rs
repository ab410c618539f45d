//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the question and answer endpoints and the
//! master definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorBody};
use crate::web::payloads::{
    respond_all, AnswerResponse, CastVoteRequest, CreateAnswerRequest, CreateQuestionRequest,
    ListQuestionsQuery, QuestionResponse, RegisterUserRequest, StatsResponse, TagResponse,
    UserResponse, VoteCastResponse, VoteResponse,
};
use crate::web::state::{AppState, Caller};
use crate::web::validation;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use qa_community_core::domain::{AnswerId, QuestionId};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_questions_handler,
        get_question_handler,
        create_question_handler,
        list_answers_handler,
        create_answer_handler,
        accept_answer_handler,
        crate::web::votes::cast_vote_handler,
        crate::web::community::list_tags_handler,
        crate::web::community::list_users_handler,
        crate::web::community::get_user_handler,
        crate::web::community::list_user_questions_handler,
        crate::web::community::register_user_handler,
        crate::web::community::current_user_handler,
        crate::web::community::stats_handler,
    ),
    components(
        schemas(
            QuestionResponse,
            AnswerResponse,
            VoteResponse,
            VoteCastResponse,
            TagResponse,
            UserResponse,
            StatsResponse,
            CreateQuestionRequest,
            CreateAnswerRequest,
            CastVoteRequest,
            RegisterUserRequest,
            ErrorBody,
        )
    ),
    tags(
        (name = "Q&A Community API", description = "Questions, answers, votes, tags and users.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Question Handlers
//=========================================================================================

/// List questions, newest first.
///
/// With `search`, every question matching the text is returned in creation order
/// instead of a page.
/// `tag` then keeps only questions carrying that exact tag.
#[utoipa::path(
    get,
    path = "/api/questions",
    params(ListQuestionsQuery),
    responses(
        (status = 200, description = "Matching questions", body = Vec<QuestionResponse>),
        (status = 400, description = "Malformed query string", body = ErrorBody)
    )
)]
pub async fn list_questions_handler(
    State(app_state): State<Arc<AppState>>,
    query: Result<Query<ListQuestionsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = validation::query_params(query)?;
    let store = &app_state.store;
    let mut questions = match query.search.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => store.search_questions(text).await?,
        _ => {
            store
                .list_questions(validation::page(query.limit, query.offset))
                .await?
        }
    };
    if let Some(tag) = &query.tag {
        questions.retain(|q| q.tags.contains(tag));
    }
    Ok(Json(respond_all::<_, QuestionResponse>(questions)))
}

/// Fetch one question. Every successful read counts as one view.
#[utoipa::path(
    get,
    path = "/api/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (
            status = 200,
            description = "The question, view already counted",
            body = QuestionResponse
        ),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "No such question", body = ErrorBody)
    )
)]
pub async fn get_question_handler(
    State(app_state): State<Arc<AppState>>,
    path: Result<Path<QuestionId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validation::path_param(path)?;
    let question = app_state.store.record_question_view(id).await?;
    Ok(Json(QuestionResponse::from(question)))
}

/// Ask a new question as the calling user.
#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Invalid question data", body = ErrorBody)
    ),
    params(
        ("x-user-id" = Option<i64>, Header, description = "Acting user, demo user if omitted.")
    )
)]
pub async fn create_question_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new_question = validation::new_question(validation::json_body(payload)?, caller.user_id)?;
    let question = app_state.store.create_question(new_question).await?;
    info!(question_id = question.id, author_id = caller.user_id, "question asked");
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

//=========================================================================================
// Answer Handlers
//=========================================================================================

/// List the answers to a question in the order they were posted.
#[utoipa::path(
    get,
    path = "/api/questions/{id}/answers",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Answers to the question", body = Vec<AnswerResponse>),
        (status = 404, description = "No such question", body = ErrorBody)
    )
)]
pub async fn list_answers_handler(
    State(app_state): State<Arc<AppState>>,
    path: Result<Path<QuestionId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validation::path_param(path)?;
    app_state.store.get_question(id).await?;
    let answers = app_state.store.answers_for_question(id).await?;
    Ok(Json(respond_all::<_, AnswerResponse>(answers)))
}

/// Answer a question as the calling user.
#[utoipa::path(
    post,
    path = "/api/questions/{id}/answers",
    request_body = CreateAnswerRequest,
    params(
        ("id" = i64, Path, description = "Question id"),
        ("x-user-id" = Option<i64>, Header, description = "Acting user, demo user if omitted.")
    ),
    responses(
        (status = 201, description = "Answer created", body = AnswerResponse),
        (status = 400, description = "Invalid answer data", body = ErrorBody),
        (status = 404, description = "No such question", body = ErrorBody)
    )
)]
pub async fn create_answer_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<QuestionId>, PathRejection>,
    payload: Result<Json<CreateAnswerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validation::path_param(path)?;
    let new_answer = validation::new_answer(id, validation::json_body(payload)?, caller.user_id)?;
    let answer = app_state.store.create_answer(new_answer).await?;
    info!(answer_id = answer.id, question_id = id, "question answered");
    Ok((StatusCode::CREATED, Json(AnswerResponse::from(answer))))
}

/// Accept an answer. Any previously accepted answer to the same question is un-accepted.
#[utoipa::path(
    post,
    path = "/api/answers/{id}/accept",
    params(("id" = i64, Path, description = "Answer id")),
    responses(
        (status = 200, description = "Answer accepted", body = AnswerResponse),
        (status = 404, description = "No such answer", body = ErrorBody)
    )
)]
pub async fn accept_answer_handler(
    State(app_state): State<Arc<AppState>>,
    path: Result<Path<AnswerId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validation::path_param(path)?;
    let answer = app_state.store.accept_answer(id).await?;
    Ok(Json(AnswerResponse::from(answer)))
}
