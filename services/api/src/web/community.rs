//! services/api/src/web/community.rs
//!
//! Handlers for tags, users, the current identity and site statistics.

use crate::error::{ApiError, ErrorBody};
use crate::web::payloads::{
    respond_all, ListTagsQuery, QuestionResponse, RegisterUserRequest, StatsResponse, TagResponse,
    UserResponse,
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
use qa_community_core::domain::UserId;
use qa_community_core::ports::PortError;
use std::sync::Arc;
use tracing::info;

//=========================================================================================
// Tags
//=========================================================================================

/// List tags in creation order, or the most used ones with `popular=true`.
#[utoipa::path(
    get,
    path = "/api/tags",
    params(ListTagsQuery),
    responses(
        (status = 200, description = "Tags", body = Vec<TagResponse>)
    )
)]
pub async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
    query: Result<Query<ListTagsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = validation::query_params(query)?;
    let store = &app_state.store;
    let tags = if query.popular.unwrap_or(false) {
        let limit = query.limit.unwrap_or(validation::DEFAULT_POPULAR_TAGS);
        store.popular_tags(limit).await?
    } else {
        let mut tags = store.list_tags().await?;
        if let Some(limit) = query.limit {
            tags.truncate(limit);
        }
        tags
    };
    Ok(Json(respond_all::<_, TagResponse>(tags)))
}

//=========================================================================================
// Users
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All registered users", body = Vec<UserResponse>)
    )
)]
pub async fn list_users_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state.store.list_users().await?;
    Ok(Json(respond_all::<_, UserResponse>(users)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "No such user", body = ErrorBody)
    )
)]
pub async fn get_user_handler(
    State(app_state): State<Arc<AppState>>,
    path: Result<Path<UserId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validation::path_param(path)?;
    let user = app_state.store.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Questions asked by one user, in the order they were asked.
#[utoipa::path(
    get,
    path = "/api/users/{id}/questions",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's questions", body = Vec<QuestionResponse>),
        (status = 404, description = "No such user", body = ErrorBody)
    )
)]
pub async fn list_user_questions_handler(
    State(app_state): State<Arc<AppState>>,
    path: Result<Path<UserId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validation::path_param(path)?;
    app_state.store.get_user(id).await?;
    let questions = app_state.store.questions_by_author(id).await?;
    Ok(Json(respond_all::<_, QuestionResponse>(questions)))
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid data, or username or email taken", body = ErrorBody)
    )
)]
pub async fn register_user_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new_user = validation::new_user(validation::json_body(payload)?)?;
    let user = app_state.store.create_user(new_user).await?;
    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// The user named by the `x-user-id` header.
///
/// Anonymous requests get 401: the demo fallback identity is not a login.
#[utoipa::path(
    get,
    path = "/api/auth/user",
    params(
        ("x-user-id" = Option<i64>, Header, description = "The user to describe.")
    ),
    responses(
        (status = 200, description = "The identified user", body = UserResponse),
        (status = 401, description = "No identity, or an unknown one", body = ErrorBody)
    )
)]
pub async fn current_user_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    if !caller.identified {
        return Err(ApiError::Unauthorized);
    }
    let user = app_state
        .store
        .get_user(caller.user_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::Unauthorized,
            other => ApiError::Port(other),
        })?;
    Ok(Json(UserResponse::from(user)))
}

//=========================================================================================
// Statistics
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Site-wide counters", body = StatsResponse)
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state.store.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}
