//! crates/qa_community_core/src/domain.rs
//!
//! Defines the pure, core data structures for the Q&A community.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

pub type UserId = i64;
pub type QuestionId = i64;
pub type AnswerId = i64;
pub type VoteId = i64;
pub type TagId = i64;

/// Raised when a stored or submitted enum value has no domain counterpart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct DomainParseError {
    pub kind: &'static str,
    pub value: String,
}

impl DomainParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Guest,
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainParseError::new("role", other)),
        }
    }
}

/// A community member. Reputation only changes through explicit updates.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub reputation: i64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Data needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

//=========================================================================================
// Questions and Answers
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    /// Net vote total, may be negative.
    pub votes: i64,
    pub views: i64,
    /// Always equals the number of stored answers referencing this question.
    pub answer_count: i64,
    pub tags: Vec<String>,
    /// Set once any answer to the question has been accepted.
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub author_id: UserId,
}

impl NewQuestion {
    /// Tag names with duplicates removed, first occurrence order preserved.
    pub fn distinct_tags(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            if !seen.contains(tag) {
                seen.push(tag.clone());
            }
        }
        seen
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub content: String,
    pub question_id: QuestionId,
    pub author_id: UserId,
    pub votes: i64,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub question_id: QuestionId,
    pub content: String,
    pub author_id: UserId,
}

//=========================================================================================
// Votes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }

    /// The change a single vote in this direction makes to a total.
    pub fn weight(&self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl FromStr for VoteDirection {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(DomainParseError::new("vote direction", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Question,
    Answer,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Question => "question",
            TargetType::Answer => "answer",
        }
    }
}

impl FromStr for TargetType {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(TargetType::Question),
            "answer" => Ok(TargetType::Answer),
            other => Err(DomainParseError::new("target type", other)),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the question or answer a vote applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteTarget {
    pub id: i64,
    pub kind: TargetType,
}

impl VoteTarget {
    pub fn question(id: QuestionId) -> Self {
        Self {
            id,
            kind: TargetType::Question,
        }
    }

    pub fn answer(id: AnswerId) -> Self {
        Self {
            id,
            kind: TargetType::Answer,
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// At most one vote exists per (user, target).
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub id: VoteId,
    pub user_id: UserId,
    pub target: VoteTarget,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
}

/// Which of the three vote transitions a cast produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Created,
    Removed,
    Switched,
}

/// The voted-on entity after its total was adjusted.
#[derive(Debug, Clone, PartialEq)]
pub enum VotedEntity {
    Question(Question),
    Answer(Answer),
}

impl VotedEntity {
    pub fn votes(&self) -> i64 {
        match self {
            VotedEntity::Question(q) => q.votes,
            VotedEntity::Answer(a) => a.votes,
        }
    }
}

/// Everything a caller needs to report the result of casting a vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteReceipt {
    pub outcome: VoteOutcome,
    pub target: VotedEntity,
    /// The vote left in place, `None` after a toggle-off.
    pub vote: Option<Vote>,
}

//=========================================================================================
// Tags and Statistics
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub description: Option<String>,
    pub use_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommunityStats {
    pub total_questions: i64,
    pub total_answers: i64,
    pub active_users: i64,
    pub questions_today: i64,
}
