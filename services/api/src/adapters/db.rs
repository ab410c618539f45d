//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete PostgreSQL
//! implementation of the `QaStore` port from the `core` crate. It handles all
//! interactions with the database using `sqlx`.
//!
//! Every multi-statement operation runs inside a transaction that first locks the
//! row being aggregated (`SELECT ... FOR UPDATE`), so concurrent requests against
//! the same question or answer are serialized by the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qa_community_core::domain::{
    Answer, AnswerId, CommunityStats, NewAnswer, NewQuestion, NewUser, Question, QuestionId,
    Role, Tag, TargetType, User, UserId, Vote, VoteDirection, VoteReceipt, VoteTarget, VotedEntity,
};
use qa_community_core::ports::{Page, PortError, PortResult, QaStore};
use qa_community_core::query::start_of_local_day;
use qa_community_core::voting::resolve_vote;
use sqlx::{FromRow, PgPool};
use tracing::debug;

macro_rules! user_columns {
    () => {
        "id, username, email, reputation, role, created_at"
    };
}

macro_rules! question_columns {
    () => {
        "id, title, content, author_id, votes, views, answer_count, tags, accepted, created_at, updated_at"
    };
}

macro_rules! answer_columns {
    () => {
        "id, content, question_id, author_id, votes, accepted, created_at, updated_at"
    };
}

macro_rules! vote_columns {
    () => {
        "id, user_id, target_id, target_type, vote_type, created_at"
    };
}

macro_rules! tag_columns {
    () => {
        "id, name, description, use_count, created_at"
    };
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `QaStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Unique violations are caller mistakes; everything else is unexpected.
fn db_error(e: sqlx::Error) -> PortError {
    let unique_violation = e
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505");
    if unique_violation {
        PortError::Validation(e.to_string())
    } else {
        PortError::Unexpected(e.to_string())
    }
}

fn not_found(kind: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind, id))
}

fn corrupt(e: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("stored value could not be read: {}", e))
}

/// `LIMIT`/`OFFSET` argument; values past `i64::MAX` saturate instead of wrapping negative.
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Turns user text into an `ILIKE` pattern that matches it literally anywhere.
fn contains_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    reputation: i64,
    role: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            reputation: self.reputation,
            role: self.role.parse::<Role>().map_err(corrupt)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    votes: i64,
    views: i64,
    answer_count: i64,
    tags: Vec<String>,
    accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            votes: self.votes,
            views: self.views,
            answer_count: self.answer_count,
            tags: self.tags,
            accepted: self.accepted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AnswerRecord {
    id: i64,
    content: String,
    question_id: i64,
    author_id: i64,
    votes: i64,
    accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl AnswerRecord {
    fn to_domain(self) -> Answer {
        Answer {
            id: self.id,
            content: self.content,
            question_id: self.question_id,
            author_id: self.author_id,
            votes: self.votes,
            accepted: self.accepted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct VoteRecord {
    id: i64,
    user_id: i64,
    target_id: i64,
    target_type: String,
    vote_type: String,
    created_at: DateTime<Utc>,
}
impl VoteRecord {
    fn to_domain(self) -> PortResult<Vote> {
        Ok(Vote {
            id: self.id,
            user_id: self.user_id,
            target: VoteTarget {
                id: self.target_id,
                kind: self.target_type.parse::<TargetType>().map_err(corrupt)?,
            },
            direction: self.vote_type.parse::<VoteDirection>().map_err(corrupt)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct TagRecord {
    id: i64,
    name: String,
    description: Option<String>,
    use_count: i64,
    created_at: DateTime<Utc>,
}
impl TagRecord {
    fn to_domain(self) -> Tag {
        Tag {
            id: self.id,
            name: self.name,
            description: self.description,
            use_count: self.use_count,
            created_at: self.created_at,
        }
    }
}

fn users_to_domain(records: Vec<UserRecord>) -> PortResult<Vec<User>> {
    records.into_iter().map(UserRecord::to_domain).collect()
}

fn questions_to_domain(records: Vec<QuestionRecord>) -> Vec<Question> {
    records.into_iter().map(QuestionRecord::to_domain).collect()
}

fn tags_to_domain(records: Vec<TagRecord>) -> Vec<Tag> {
    records.into_iter().map(TagRecord::to_domain).collect()
}

//=========================================================================================
// `QaStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl QaStore for DbAdapter {
    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        users_to_domain(records)
    }

    async fn get_user(&self, id: UserId) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("User", id))?
        .to_domain()
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("User", username))?
        .to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("User with email", email))?
        .to_domain()
    }

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let user = sqlx::query_as::<_, UserRecord>(concat!(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING ",
            user_columns!()
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?
        .to_domain()?;
        debug!(user_id = user.id, "user created");
        Ok(user)
    }

    async fn update_user_reputation(&self, id: UserId, reputation: i64) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(concat!(
            "UPDATE users SET reputation = $1 WHERE id = $2 RETURNING ",
            user_columns!()
        ))
        .bind(reputation)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("User", id))?
        .to_domain()
    }

    async fn list_questions(&self, page: Page) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(concat!(
            "SELECT ",
            question_columns!(),
            " FROM questions ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(sql_count(page.limit))
        .bind(sql_count(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(questions_to_domain(records))
    }

    async fn get_question(&self, id: QuestionId) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(concat!(
            "SELECT ",
            question_columns!(),
            " FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Question", id))?;
        Ok(record.to_domain())
    }

    async fn questions_by_author(&self, author_id: UserId) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(concat!(
            "SELECT ",
            question_columns!(),
            " FROM questions WHERE author_id = $1 ORDER BY id"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(questions_to_domain(records))
    }

    async fn search_questions(&self, text: &str) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(concat!(
            "SELECT ",
            question_columns!(),
            " FROM questions WHERE title ILIKE $1 OR content ILIKE $1",
            " OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $1)",
            " ORDER BY id"
        ))
        .bind(contains_pattern(text))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(questions_to_domain(records))
    }

    async fn create_question(&self, new_question: NewQuestion) -> PortResult<Question> {
        let tags = new_question.distinct_tags();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let record = sqlx::query_as::<_, QuestionRecord>(concat!(
            "INSERT INTO questions (title, content, author_id, tags) VALUES ($1, $2, $3, $4) RETURNING ",
            question_columns!()
        ))
        .bind(&new_question.title)
        .bind(&new_question.content)
        .bind(new_question.author_id)
        .bind(&tags)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        for name in &tags {
            sqlx::query(
                "INSERT INTO tags (name, use_count) VALUES ($1, 1) \
                 ON CONFLICT (name) DO UPDATE SET use_count = tags.use_count + 1",
            )
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        debug!(question_id = record.id, tags = ?tags, "question created");
        Ok(record.to_domain())
    }

    async fn record_question_view(&self, id: QuestionId) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(concat!(
            "UPDATE questions SET views = views + 1 WHERE id = $1 RETURNING ",
            question_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Question", id))?;
        Ok(record.to_domain())
    }

    async fn answers_for_question(&self, question_id: QuestionId) -> PortResult<Vec<Answer>> {
        let records = sqlx::query_as::<_, AnswerRecord>(concat!(
            "SELECT ",
            answer_columns!(),
            " FROM answers WHERE question_id = $1 ORDER BY id"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(records.into_iter().map(AnswerRecord::to_domain).collect())
    }

    async fn get_answer(&self, id: AnswerId) -> PortResult<Answer> {
        let record = sqlx::query_as::<_, AnswerRecord>(concat!(
            "SELECT ",
            answer_columns!(),
            " FROM answers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Answer", id))?;
        Ok(record.to_domain())
    }

    async fn create_answer(&self, new_answer: NewAnswer) -> PortResult<Answer> {
        let question_id = new_answer.question_id;
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(question_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found("Question", question_id))?;

        let record = sqlx::query_as::<_, AnswerRecord>(concat!(
            "INSERT INTO answers (content, question_id, author_id) VALUES ($1, $2, $3) RETURNING ",
            answer_columns!()
        ))
        .bind(&new_answer.content)
        .bind(question_id)
        .bind(new_answer.author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query(
            "UPDATE questions SET answer_count = \
             (SELECT COUNT(*) FROM answers WHERE question_id = $1) WHERE id = $1",
        )
        .bind(question_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(answer_id = record.id, question_id, "answer created");
        Ok(record.to_domain())
    }

    async fn accept_answer(&self, id: AnswerId) -> PortResult<Answer> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let question_id =
            sqlx::query_scalar::<_, i64>("SELECT question_id FROM answers WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?
                .ok_or_else(|| not_found("Answer", id))?;

        sqlx::query("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query(
            "UPDATE answers SET accepted = (id = $1) \
             WHERE question_id = $2 AND (accepted OR id = $1)",
        )
        .bind(id)
        .bind(question_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query("UPDATE questions SET accepted = TRUE WHERE id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let record = sqlx::query_as::<_, AnswerRecord>(concat!(
            "SELECT ",
            answer_columns!(),
            " FROM answers WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(answer_id = id, question_id, "answer accepted");
        Ok(record.to_domain())
    }

    async fn get_vote(&self, user_id: UserId, target: VoteTarget) -> PortResult<Option<Vote>> {
        sqlx::query_as::<_, VoteRecord>(concat!(
            "SELECT ",
            vote_columns!(),
            " FROM votes WHERE user_id = $1 AND target_id = $2 AND target_type = $3"
        ))
        .bind(user_id)
        .bind(target.id)
        .bind(target.kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(VoteRecord::to_domain)
        .transpose()
    }

    async fn cast_vote(
        &self,
        user_id: UserId,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> PortResult<VoteReceipt> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let lock_target = match target.kind {
            TargetType::Question => "SELECT id FROM questions WHERE id = $1 FOR UPDATE",
            TargetType::Answer => "SELECT id FROM answers WHERE id = $1 FOR UPDATE",
        };
        sqlx::query_scalar::<_, i64>(lock_target)
            .bind(target.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found(target.kind.as_str(), target.id))?;

        let existing = sqlx::query_as::<_, VoteRecord>(concat!(
            "SELECT ",
            vote_columns!(),
            " FROM votes WHERE user_id = $1 AND target_id = $2 AND target_type = $3 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(target.id)
        .bind(target.kind.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .map(VoteRecord::to_domain)
        .transpose()?;

        let resolution = resolve_vote(existing.as_ref().map(|v| v.direction), direction);

        if let Some(old) = &existing {
            sqlx::query("DELETE FROM votes WHERE id = $1")
                .bind(old.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        let vote = match resolution.stored {
            Some(stored) => Some(
                sqlx::query_as::<_, VoteRecord>(concat!(
                    "INSERT INTO votes (user_id, target_id, target_type, vote_type) \
                     VALUES ($1, $2, $3, $4) RETURNING ",
                    vote_columns!()
                ))
                .bind(user_id)
                .bind(target.id)
                .bind(target.kind.as_str())
                .bind(stored.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| match db_error(e) {
                    PortError::Validation(msg) => PortError::InvariantViolation(msg),
                    other => other,
                })?
                .to_domain()?,
            ),
            None => None,
        };

        let entity = match target.kind {
            TargetType::Question => VotedEntity::Question(
                sqlx::query_as::<_, QuestionRecord>(concat!(
                    "UPDATE questions SET votes = votes + $1 WHERE id = $2 RETURNING ",
                    question_columns!()
                ))
                .bind(resolution.delta)
                .bind(target.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?
                .to_domain(),
            ),
            TargetType::Answer => VotedEntity::Answer(
                sqlx::query_as::<_, AnswerRecord>(concat!(
                    "UPDATE answers SET votes = votes + $1 WHERE id = $2 RETURNING ",
                    answer_columns!()
                ))
                .bind(resolution.delta)
                .bind(target.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?
                .to_domain(),
            ),
        };

        tx.commit().await.map_err(db_error)?;
        debug!(user_id, %target, outcome = ?resolution.outcome, "vote cast");
        Ok(VoteReceipt {
            outcome: resolution.outcome,
            target: entity,
            vote,
        })
    }

    async fn list_tags(&self) -> PortResult<Vec<Tag>> {
        let records = sqlx::query_as::<_, TagRecord>(concat!(
            "SELECT ",
            tag_columns!(),
            " FROM tags ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(tags_to_domain(records))
    }

    async fn popular_tags(&self, limit: usize) -> PortResult<Vec<Tag>> {
        let records = sqlx::query_as::<_, TagRecord>(concat!(
            "SELECT ",
            tag_columns!(),
            " FROM tags ORDER BY use_count DESC, id LIMIT $1"
        ))
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(tags_to_domain(records))
    }

    async fn create_tag(&self, name: &str, description: Option<&str>) -> PortResult<Tag> {
        let record = sqlx::query_as::<_, TagRecord>(concat!(
            "INSERT INTO tags (name, description) VALUES ($1, $2) RETURNING ",
            tag_columns!()
        ))
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain())
    }

    async fn update_tag_use_count(&self, name: &str, use_count: i64) -> PortResult<Tag> {
        let record = sqlx::query_as::<_, TagRecord>(concat!(
            "UPDATE tags SET use_count = $1 WHERE name = $2 RETURNING ",
            tag_columns!()
        ))
        .bind(use_count)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Tag", name))?;
        Ok(record.to_domain())
    }

    async fn stats(&self) -> PortResult<CommunityStats> {
        let (total_questions, total_answers, active_users, questions_today) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                "SELECT (SELECT COUNT(*) FROM questions), \
                 (SELECT COUNT(*) FROM answers), \
                 (SELECT COUNT(*) FROM users), \
                 (SELECT COUNT(*) FROM questions WHERE created_at >= $1)",
            )
            .bind(start_of_local_day(Utc::now()))
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(CommunityStats {
            total_questions,
            total_answers,
            active_users,
            questions_today,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_like_wildcards() {
        assert_eq!(contains_pattern("jwt"), "%jwt%");
        assert_eq!(contains_pattern("100%_sure"), "%100\\%\\_sure%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn limits_and_offsets_saturate_instead_of_wrapping() {
        assert_eq!(sql_count(20), 20);
        assert_eq!(sql_count(usize::MAX), i64::MAX);
    }
}
