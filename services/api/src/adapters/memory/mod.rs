//! services/api/src/adapters/memory/mod.rs
//!
//! The in-memory adapter: a process-local implementation of the `QaStore` port.
//! All tables sit behind one `RwLock`, so every read-modify-write sequence
//! (vote casts, answer creation, view counting, accepting) runs under a single
//! write guard and can never interleave with another mutation.

mod sample_data;
mod table;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qa_community_core::domain::{
    Answer, AnswerId, CommunityStats, NewAnswer, NewQuestion, NewUser, Question, QuestionId,
    Role, Tag, TargetType, User, UserId, Vote, VoteDirection, VoteReceipt, VoteTarget,
    VotedEntity,
};
use qa_community_core::ports::{Page, PortError, PortResult, QaStore};
use qa_community_core::query::{
    paginate, question_matches, rank_popular, sort_newest_first, start_of_local_day,
};
use qa_community_core::voting::resolve_vote;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use table::Table;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An in-memory store that implements the `QaStore` port.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }

    /// Creates a store preloaded with the demo users, tags, questions and answers.
    pub fn with_sample_data() -> Self {
        Self {
            tables: RwLock::new(sample_data::seeded(Utc::now())),
        }
    }

    fn read(&self) -> PortResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| PortError::Unexpected("store lock poisoned during read".to_string()))
    }

    fn write(&self) -> PortResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| PortError::Unexpected("store lock poisoned during write".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================================
// Tables
//=========================================================================================

type VoteKey = (UserId, VoteTarget);

pub(crate) struct Tables {
    users: Table<User>,
    questions: Table<Question>,
    answers: Table<Answer>,
    tags: Table<Tag>,
    votes: HashMap<VoteKey, Vote>,
    next_vote_id: i64,
}

fn not_found(kind: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind, id))
}

impl Tables {
    fn new() -> Self {
        Self {
            users: Table::new(),
            questions: Table::new(),
            answers: Table::new(),
            tags: Table::new(),
            votes: HashMap::new(),
            next_vote_id: 1,
        }
    }

    fn user(&self, id: UserId) -> PortResult<&User> {
        self.users.get(id).ok_or_else(|| not_found("User", id))
    }

    fn question(&self, id: QuestionId) -> PortResult<&Question> {
        self.questions.get(id).ok_or_else(|| not_found("Question", id))
    }

    fn answer(&self, id: AnswerId) -> PortResult<&Answer> {
        self.answers.get(id).ok_or_else(|| not_found("Answer", id))
    }

    fn insert_user(&mut self, new_user: NewUser, now: DateTime<Utc>) -> PortResult<User> {
        if self.users.find(|u| u.username == new_user.username).is_some() {
            return Err(PortError::Validation(format!(
                "username '{}' is already taken",
                new_user.username
            )));
        }
        if self.users.find(|u| u.email == new_user.email).is_some() {
            return Err(PortError::Validation(format!(
                "email '{}' is already registered",
                new_user.email
            )));
        }
        Ok(self.users.insert(|id| User {
            id,
            username: new_user.username,
            email: new_user.email,
            reputation: 0,
            role: Role::User,
            created_at: now,
        }))
    }

    fn insert_tag(
        &mut self,
        name: &str,
        description: Option<&str>,
        use_count: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Tag> {
        if self.tags.find(|t| t.name == name).is_some() {
            return Err(PortError::Validation(format!("tag '{}' already exists", name)));
        }
        Ok(self.tags.insert(|id| Tag {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            use_count,
            created_at: now,
        }))
    }

    fn insert_question(&mut self, new_question: NewQuestion, now: DateTime<Utc>) -> Question {
        let tags = new_question.distinct_tags();
        for name in &tags {
            match self.tags.find(|t| &t.name == name).map(|t| t.id) {
                Some(tag_id) => {
                    self.tags.update(tag_id, |t| t.use_count += 1);
                }
                None => {
                    self.tags.insert(|id| Tag {
                        id,
                        name: name.clone(),
                        description: None,
                        use_count: 1,
                        created_at: now,
                    });
                }
            }
        }

        self.questions.insert(|id| Question {
            id,
            title: new_question.title,
            content: new_question.content,
            author_id: new_question.author_id,
            votes: 0,
            views: 0,
            answer_count: 0,
            tags,
            accepted: false,
            created_at: now,
            updated_at: now,
        })
    }

    fn insert_answer(&mut self, new_answer: NewAnswer, now: DateTime<Utc>) -> PortResult<Answer> {
        let question_id = new_answer.question_id;
        self.question(question_id)?;

        let answer = self.answers.insert(|id| Answer {
            id,
            content: new_answer.content,
            question_id,
            author_id: new_answer.author_id,
            votes: 0,
            accepted: false,
            created_at: now,
            updated_at: now,
        });

        let count = self.answers.filter(|a| a.question_id == question_id).len() as i64;
        self.questions
            .update(question_id, |q| q.answer_count = count)
            .ok_or_else(|| not_found("Question", question_id))?;
        Ok(answer)
    }

    fn accept(&mut self, id: AnswerId) -> PortResult<Answer> {
        let question_id = self.answer(id)?.question_id;

        self.answers.update_where(
            |a| a.question_id == question_id && a.id != id,
            |a| a.accepted = false,
        );
        let accepted = self
            .answers
            .update(id, |a| a.accepted = true)
            .ok_or_else(|| not_found("Answer", id))?;
        self.questions.update(question_id, |q| q.accepted = true);
        Ok(accepted)
    }

    fn ensure_target(&self, target: VoteTarget) -> PortResult<()> {
        match target.kind {
            TargetType::Question => self.question(target.id).map(|_| ()),
            TargetType::Answer => self.answer(target.id).map(|_| ()),
        }
    }

    fn insert_vote(
        &mut self,
        user_id: UserId,
        target: VoteTarget,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> PortResult<Vote> {
        let key = (user_id, target);
        if self.votes.contains_key(&key) {
            return Err(PortError::InvariantViolation(format!(
                "user {} already holds a vote on {}",
                user_id, target
            )));
        }
        let vote = Vote {
            id: self.next_vote_id,
            user_id,
            target,
            direction,
            created_at: now,
        };
        self.next_vote_id += 1;
        self.votes.insert(key, vote.clone());
        Ok(vote)
    }

    fn adjust_votes(&mut self, target: VoteTarget, delta: i64) -> PortResult<VotedEntity> {
        let updated = match target.kind {
            TargetType::Question => self
                .questions
                .update(target.id, |q| q.votes += delta)
                .map(VotedEntity::Question),
            TargetType::Answer => self
                .answers
                .update(target.id, |a| a.votes += delta)
                .map(VotedEntity::Answer),
        };
        updated.ok_or_else(|| not_found(target.kind.as_str(), target.id))
    }

    fn cast_vote(
        &mut self,
        user_id: UserId,
        target: VoteTarget,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> PortResult<VoteReceipt> {
        self.ensure_target(target)?;

        let key = (user_id, target);
        let resolution = resolve_vote(self.votes.get(&key).map(|v| v.direction), direction);

        self.votes.remove(&key);
        let vote = match resolution.stored {
            Some(stored) => Some(self.insert_vote(user_id, target, stored, now)?),
            None => None,
        };
        let entity = self.adjust_votes(target, resolution.delta)?;

        Ok(VoteReceipt {
            outcome: resolution.outcome,
            target: entity,
            vote,
        })
    }

    fn stats(&self, day_start: DateTime<Utc>) -> CommunityStats {
        CommunityStats {
            total_questions: self.questions.len() as i64,
            total_answers: self.answers.len() as i64,
            active_users: self.users.len() as i64,
            questions_today: self
                .questions
                .values()
                .filter(|q| q.created_at >= day_start)
                .count() as i64,
        }
    }
}

//=========================================================================================
// `QaStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl QaStore for MemoryStore {
    async fn list_users(&self) -> PortResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn get_user(&self, id: UserId) -> PortResult<User> {
        self.read()?.user(id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<User> {
        self.read()?
            .users
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| not_found("User", username))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        self.read()?
            .users
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| not_found("User with email", email))
    }

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let user = self.write()?.insert_user(new_user, Utc::now())?;
        debug!(user_id = user.id, "user created");
        Ok(user)
    }

    async fn update_user_reputation(&self, id: UserId, reputation: i64) -> PortResult<User> {
        self.write()?
            .users
            .update(id, |u| u.reputation = reputation)
            .ok_or_else(|| not_found("User", id))
    }

    async fn list_questions(&self, page: Page) -> PortResult<Vec<Question>> {
        let mut questions: Vec<Question> = self.read()?.questions.values().cloned().collect();
        sort_newest_first(&mut questions);
        Ok(paginate(questions, page))
    }

    async fn get_question(&self, id: QuestionId) -> PortResult<Question> {
        self.read()?.question(id).cloned()
    }

    async fn questions_by_author(&self, author_id: UserId) -> PortResult<Vec<Question>> {
        Ok(self.read()?.questions.filter(|q| q.author_id == author_id))
    }

    async fn search_questions(&self, text: &str) -> PortResult<Vec<Question>> {
        Ok(self.read()?.questions.filter(|q| question_matches(q, text)))
    }

    async fn create_question(&self, new_question: NewQuestion) -> PortResult<Question> {
        let question = self.write()?.insert_question(new_question, Utc::now());
        debug!(question_id = question.id, tags = ?question.tags, "question created");
        Ok(question)
    }

    async fn record_question_view(&self, id: QuestionId) -> PortResult<Question> {
        self.write()?
            .questions
            .update(id, |q| q.views += 1)
            .ok_or_else(|| not_found("Question", id))
    }

    async fn answers_for_question(&self, question_id: QuestionId) -> PortResult<Vec<Answer>> {
        Ok(self.read()?.answers.filter(|a| a.question_id == question_id))
    }

    async fn get_answer(&self, id: AnswerId) -> PortResult<Answer> {
        self.read()?.answer(id).cloned()
    }

    async fn create_answer(&self, new_answer: NewAnswer) -> PortResult<Answer> {
        let answer = self.write()?.insert_answer(new_answer, Utc::now())?;
        debug!(answer_id = answer.id, question_id = answer.question_id, "answer created");
        Ok(answer)
    }

    async fn accept_answer(&self, id: AnswerId) -> PortResult<Answer> {
        let answer = self.write()?.accept(id)?;
        debug!(answer_id = id, question_id = answer.question_id, "answer accepted");
        Ok(answer)
    }

    async fn get_vote(&self, user_id: UserId, target: VoteTarget) -> PortResult<Option<Vote>> {
        Ok(self.read()?.votes.get(&(user_id, target)).cloned())
    }

    async fn cast_vote(
        &self,
        user_id: UserId,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> PortResult<VoteReceipt> {
        let receipt = self
            .write()?
            .cast_vote(user_id, target, direction, Utc::now())?;
        debug!(
            user_id,
            %target,
            outcome = ?receipt.outcome,
            total = receipt.target.votes(),
            "vote cast"
        );
        Ok(receipt)
    }

    async fn list_tags(&self) -> PortResult<Vec<Tag>> {
        Ok(self.read()?.tags.values().cloned().collect())
    }

    async fn popular_tags(&self, limit: usize) -> PortResult<Vec<Tag>> {
        let tags: Vec<Tag> = self.read()?.tags.values().cloned().collect();
        Ok(rank_popular(tags, limit))
    }

    async fn create_tag(&self, name: &str, description: Option<&str>) -> PortResult<Tag> {
        self.write()?.insert_tag(name, description, 0, Utc::now())
    }

    async fn update_tag_use_count(&self, name: &str, use_count: i64) -> PortResult<Tag> {
        let mut tables = self.write()?;
        let tag_id = tables
            .tags
            .find(|t| t.name == name)
            .map(|t| t.id)
            .ok_or_else(|| not_found("Tag", name))?;
        tables
            .tags
            .update(tag_id, |t| t.use_count = use_count)
            .ok_or_else(|| not_found("Tag", name))
    }

    async fn stats(&self) -> PortResult<CommunityStats> {
        Ok(self.read()?.stats(start_of_local_day(Utc::now())))
    }
}
