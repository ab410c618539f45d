//! services/api/src/adapters/memory/sample_data.rs
//!
//! Demo content so a freshly started in-memory server has something to show.

use chrono::{DateTime, Duration, Utc};
use qa_community_core::domain::{Answer, Question, Role, Tag, User};

use super::Tables;

const USERS: [(&str, &str, i64, Role, i64); 4] = [
    ("john_doe", "john@example.com", 1234, Role::User, 640),
    ("alice_smith", "alice@example.com", 567, Role::User, 494),
    ("mike_johnson", "mike@example.com", 2891, Role::User, 1061),
    ("admin", "admin@example.com", 5000, Role::Admin, 1750),
];

const TAGS: [(&str, &str, i64); 5] = [
    ("javascript", "JavaScript programming language", 150),
    ("react", "React.js library", 120),
    ("python", "Python programming language", 98),
    ("css", "Cascading Style Sheets", 87),
    ("html", "HyperText Markup Language", 76),
];

struct SampleQuestion {
    title: &'static str,
    content: &'static str,
    author_id: i64,
    votes: i64,
    views: i64,
    tags: &'static [&'static str],
    hours_ago: i64,
    accepted_answer: Option<(&'static str, i64)>,
}

const QUESTIONS: [SampleQuestion; 3] = [
    SampleQuestion {
        title: "How to implement user authentication in React with JWT tokens?",
        content: "I'm trying to implement JWT-based authentication in my React application, but I'm struggling with storing the tokens securely and handling token refresh...",
        author_id: 1,
        votes: 15,
        views: 127,
        tags: &["react", "jwt", "authentication"],
        hours_ago: 5,
        accepted_answer: None,
    },
    SampleQuestion {
        title: "Best practices for CSS Grid vs Flexbox layout?",
        content: "When should I use CSS Grid over Flexbox? I understand the basics but need guidance on real-world scenarios and performance considerations...",
        author_id: 2,
        votes: 7,
        views: 89,
        tags: &["css", "layout", "flexbox", "grid"],
        hours_ago: 28,
        accepted_answer: Some((
            "Use Grid for two-dimensional page layout and Flexbox for one-dimensional alignment inside components.",
            3,
        )),
    },
    SampleQuestion {
        title: "How to optimize database queries for large datasets?",
        content: "My application is struggling with performance when dealing with tables containing millions of rows. What are the best indexing strategies and query optimization techniques...",
        author_id: 3,
        votes: 23,
        views: 412,
        tags: &["database", "performance", "sql"],
        hours_ago: 52,
        accepted_answer: None,
    },
];

pub(super) fn seeded(now: DateTime<Utc>) -> Tables {
    let mut tables = Tables::new();

    for (username, email, reputation, role, days_ago) in USERS {
        tables.users.insert(|id| User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            reputation,
            role,
            created_at: now - Duration::days(days_ago),
        });
    }

    for (name, description, use_count) in TAGS {
        tables.tags.insert(|id| Tag {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            use_count,
            created_at: now,
        });
    }

    for sample in &QUESTIONS {
        let created_at = now - Duration::hours(sample.hours_ago);
        let question = tables.questions.insert(|id| Question {
            id,
            title: sample.title.to_string(),
            content: sample.content.to_string(),
            author_id: sample.author_id,
            votes: sample.votes,
            views: sample.views,
            answer_count: 0,
            tags: sample.tags.iter().map(|t| t.to_string()).collect(),
            accepted: false,
            created_at,
            updated_at: created_at,
        });

        if let Some((content, author_id)) = sample.accepted_answer {
            let answered_at = created_at + Duration::hours(2);
            tables.answers.insert(|id| Answer {
                id,
                content: content.to_string(),
                question_id: question.id,
                author_id,
                votes: 0,
                accepted: true,
                created_at: answered_at,
                updated_at: answered_at,
            });
            tables.questions.update(question.id, |q| {
                q.answer_count = 1;
                q.accepted = true;
            });
        }
    }

    tables
}
