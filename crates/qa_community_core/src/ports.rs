//! crates/qa_community_core/src/ports.rs
//!
//! Defines the storage contract for the application's core logic.
//! This trait forms the boundary of the hexagonal architecture, allowing the core
//! to be independent of whether entities live in process memory or in PostgreSQL.

use async_trait::async_trait;

use crate::domain::{
    Answer, AnswerId, CommunityStats, NewAnswer, NewQuestion, NewUser, Question, QuestionId,
    Tag, User, UserId, Vote, VoteDirection, VoteReceipt, VoteTarget,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the backing store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    /// A write would have broken a store invariant. Never expected in practice.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Offset/limit window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

//=========================================================================================
// Storage Port
//=========================================================================================

/// Every method runs atomically with respect to every other method on the same store.
#[async_trait]
pub trait QaStore: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn get_user(&self, id: UserId) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    /// Registers a user with role `user` and zero reputation.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn update_user_reputation(&self, id: UserId, reputation: i64) -> PortResult<User>;

    // --- Questions ---
    /// Newest first, sliced by `page`.
    async fn list_questions(&self, page: Page) -> PortResult<Vec<Question>>;

    async fn get_question(&self, id: QuestionId) -> PortResult<Question>;

    async fn questions_by_author(&self, author_id: UserId) -> PortResult<Vec<Question>>;

    /// Case-insensitive substring match over title, content and tags, in creation order.
    async fn search_questions(&self, text: &str) -> PortResult<Vec<Question>>;

    /// Stores the question and bumps the use count of each of its tags.
    async fn create_question(&self, new_question: NewQuestion) -> PortResult<Question>;

    /// Increments the view count by exactly one.
    async fn record_question_view(&self, id: QuestionId) -> PortResult<Question>;

    // --- Answers ---
    async fn answers_for_question(&self, question_id: QuestionId) -> PortResult<Vec<Answer>>;

    async fn get_answer(&self, id: AnswerId) -> PortResult<Answer>;

    /// Stores the answer and recomputes the owning question's answer count.
    async fn create_answer(&self, new_answer: NewAnswer) -> PortResult<Answer>;

    /// Marks the answer accepted, clearing any sibling previously accepted.
    async fn accept_answer(&self, id: AnswerId) -> PortResult<Answer>;

    // --- Votes ---
    async fn get_vote(&self, user_id: UserId, target: VoteTarget) -> PortResult<Option<Vote>>;

    async fn cast_vote(
        &self,
        user_id: UserId,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> PortResult<VoteReceipt>;

    // --- Tags ---
    async fn list_tags(&self) -> PortResult<Vec<Tag>>;

    async fn popular_tags(&self, limit: usize) -> PortResult<Vec<Tag>>;

    async fn create_tag(&self, name: &str, description: Option<&str>) -> PortResult<Tag>;

    async fn update_tag_use_count(&self, name: &str, use_count: i64) -> PortResult<Tag>;

    // --- Statistics ---
    async fn stats(&self) -> PortResult<CommunityStats>;
}
