//! services/api/src/web/payloads.rs
//!
//! Request and response bodies of the JSON API. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use qa_community_core::domain::{
    Answer, CommunityStats, Question, Tag, User, Vote, VoteOutcome, VoteReceipt, VotedEntity,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerRequest {
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub target_id: i64,
    /// `question` or `answer`.
    pub target_type: String,
    /// `up` or `down`.
    pub vote_type: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuestionsQuery {
    /// Page size, 20 when omitted.
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Case-insensitive text matched against titles, bodies and tags.
    pub search: Option<String>,
    /// Keep only questions carrying exactly this tag.
    pub tag: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTagsQuery {
    /// Rank by use count instead of listing in creation order.
    pub popular: Option<bool>,
    pub limit: Option<usize>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub reputation: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            reputation: user.reputation,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub votes: i64,
    pub views: i64,
    pub answer_count: i64,
    pub tags: Vec<String>,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            title: q.title,
            content: q.content,
            author_id: q.author_id,
            votes: q.votes,
            views: q.views,
            answer_count: q.answer_count,
            tags: q.tags,
            accepted: q.accepted,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: i64,
    pub content: String,
    pub question_id: i64,
    pub author_id: i64,
    pub votes: i64,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Answer> for AnswerResponse {
    fn from(a: Answer) -> Self {
        Self {
            id: a.id,
            content: a.content,
            question_id: a.question_id,
            author_id: a.author_id,
            votes: a.votes,
            accepted: a.accepted,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: i64,
    pub user_id: i64,
    pub target_id: i64,
    pub target_type: String,
    pub vote_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<Vote> for VoteResponse {
    fn from(v: Vote) -> Self {
        Self {
            id: v.id,
            user_id: v.user_id,
            target_id: v.target.id,
            target_type: v.target.kind.as_str().to_string(),
            vote_type: v.direction.as_str().to_string(),
            created_at: v.created_at,
        }
    }
}

/// Result of casting a vote: what happened and the target's new state.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteCastResponse {
    pub message: String,
    /// `created`, `removed` or `switched`.
    pub outcome: String,
    /// The target's vote total after the cast.
    pub votes: i64,
    pub vote: Option<VoteResponse>,
    pub question: Option<QuestionResponse>,
    pub answer: Option<AnswerResponse>,
}

impl From<VoteReceipt> for VoteCastResponse {
    fn from(receipt: VoteReceipt) -> Self {
        let (outcome, message) = match receipt.outcome {
            VoteOutcome::Created => ("created", "Vote recorded"),
            VoteOutcome::Removed => ("removed", "Vote removed"),
            VoteOutcome::Switched => ("switched", "Vote changed"),
        };
        let votes = receipt.target.votes();
        let (question, answer) = match receipt.target {
            VotedEntity::Question(q) => (Some(q.into()), None),
            VotedEntity::Answer(a) => (None, Some(a.into())),
        };
        Self {
            message: message.to_string(),
            outcome: outcome.to_string(),
            votes,
            vote: receipt.vote.map(Into::into),
            question,
            answer,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub use_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Tag> for TagResponse {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            use_count: t.use_count,
            created_at: t.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_questions: i64,
    pub total_answers: i64,
    pub active_users: i64,
    pub questions_today: i64,
}

impl From<CommunityStats> for StatsResponse {
    fn from(s: CommunityStats) -> Self {
        Self {
            total_questions: s.total_questions,
            total_answers: s.total_answers,
            active_users: s.active_users,
            questions_today: s.questions_today,
        }
    }
}

/// Converts a list of domain values into their response bodies.
pub fn respond_all<D, R: From<D>>(items: Vec<D>) -> Vec<R> {
    items.into_iter().map(R::from).collect()
}
