//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request caller identity.

use crate::config::Config;
use qa_community_core::domain::UserId;
use qa_community_core::ports::QaStore;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// Tests build one per case around a fresh store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QaStore>,
    pub config: Arc<Config>,
}

//=========================================================================================
// Caller (Specific to One Request)
//=========================================================================================

/// Who a request acts on behalf of. Identity is asserted by the client, never verified here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    /// False when the request carried no identity and the demo user was assumed.
    pub identified: bool,
}
