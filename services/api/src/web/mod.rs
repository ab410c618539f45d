pub mod community;
pub mod middleware;
pub mod payloads;
pub mod rest;
pub mod state;
pub mod validation;
pub mod votes;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::resolve_caller;
pub use rest::ApiDoc;
pub use state::{AppState, Caller};

/// Builds the `/api` router over the given state. The binary layers CORS and the
/// Swagger UI on top; tests drive this router directly.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/user", get(community::current_user_handler))
        .route(
            "/api/questions",
            get(rest::list_questions_handler).post(rest::create_question_handler),
        )
        .route("/api/questions/{id}", get(rest::get_question_handler))
        .route(
            "/api/questions/{id}/answers",
            get(rest::list_answers_handler).post(rest::create_answer_handler),
        )
        .route("/api/answers/{id}/accept", post(rest::accept_answer_handler))
        .route("/api/votes", post(votes::cast_vote_handler))
        .route("/api/tags", get(community::list_tags_handler))
        .route(
            "/api/users",
            get(community::list_users_handler).post(community::register_user_handler),
        )
        .route("/api/users/{id}", get(community::get_user_handler))
        .route("/api/users/{id}/questions", get(community::list_user_questions_handler))
        .route("/api/stats", get(community::stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            resolve_caller,
        ))
        .with_state(app_state)
}

#[cfg(test)]
mod tests;
