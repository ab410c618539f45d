//! services/api/src/web/middleware.rs
//!
//! Caller resolution middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use qa_community_core::domain::UserId;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::{AppState, Caller};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that resolves the acting user from the `x-user-id` header.
///
/// Requests without the header act as the configured demo user. A header that is
/// present but not a valid id is rejected with 400 Bad Request.
pub async fn resolve_caller(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match req.headers().get(USER_ID_HEADER) {
        None => Caller {
            user_id: state.config.demo_user_id,
            identified: false,
        },
        Some(value) => {
            let user_id = value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<UserId>().ok())
                .ok_or_else(|| ApiError::Validation("Invalid x-user-id format".to_string()))?;
            Caller {
                user_id,
                identified: true,
            }
        }
    };

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
