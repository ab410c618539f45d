//! crates/qa_community_core/src/query.rs
//!
//! Store-independent listing helpers: search matching, ordering, slicing and
//! the "today" boundary used by the statistics.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};

use crate::domain::{Question, Tag};
use crate::ports::Page;

/// Case-insensitive substring match against the title, the content or any tag.
pub fn question_matches(question: &Question, text: &str) -> bool {
    let needle = text.to_lowercase();
    question.title.to_lowercase().contains(&needle)
        || question.content.to_lowercase().contains(&needle)
        || question
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
}

/// Newest first; ties fall back to the higher id.
pub fn sort_newest_first(questions: &mut [Question]) {
    questions.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

pub fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect()
}

/// Descending by use count. The sort is stable, so equal counts keep their input order.
pub fn rank_popular(mut tags: Vec<Tag>, limit: usize) -> Vec<Tag> {
    tags.sort_by(|a, b| b.use_count.cmp(&a.use_count));
    tags.truncate(limit);
    tags
}

/// Start of the calendar day containing `now`, in the server's local time zone.
pub fn start_of_local_day(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day_in(now, &Local)
}

pub fn start_of_day_in<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let midnight = now.with_timezone(tz).date_naive().and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|start| start.with_timezone(&Utc))
        // Midnight skipped by a DST jump; treat the wall-clock value as UTC.
        .unwrap_or_else(|| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn question(id: i64, title: &str, tags: &[&str], age_minutes: i64) -> Question {
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        Question {
            id,
            title: title.to_string(),
            content: "Some body text".to_string(),
            author_id: 1,
            votes: 0,
            views: 0,
            answer_count: 0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            accepted: false,
            created_at,
            updated_at: created_at,
        }
    }

    fn tag(id: i64, name: &str, use_count: i64) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            description: None,
            use_count,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn search_ignores_case_across_title_content_and_tags() {
        let q = question(
            1,
            "How to implement user authentication in React with JWT tokens?",
            &["React", "jwt"],
            0,
        );
        assert!(question_matches(&q, "jwt"));
        assert!(question_matches(&q, "REACT"));
        assert!(question_matches(&q, "body"));
        assert!(!question_matches(&q, "nonexistent-zzz"));
    }

    #[test]
    fn newest_first_breaks_ties_by_id() {
        let mut qs = vec![question(1, "old", &[], 60), question(2, "new", &[], 5)];
        let same_time = qs[1].created_at;
        let mut twin = question(3, "twin", &[], 0);
        twin.created_at = same_time;
        qs.push(twin);

        sort_newest_first(&mut qs);
        let ids: Vec<i64> = qs.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn paginate_slices_by_offset_and_limit() {
        let items: Vec<i32> = (1..=10).collect();
        assert_eq!(paginate(items.clone(), Page::new(3, 2)), vec![3, 4, 5]);
        assert_eq!(paginate(items.clone(), Page::new(5, 8)), vec![9, 10]);
        assert!(paginate(items, Page::new(5, 20)).is_empty());
    }

    #[test]
    fn popular_tags_are_ranked_and_truncated() {
        let tags = vec![tag(1, "css", 87), tag(2, "react", 120), tag(3, "python", 98)];
        let ranked = rank_popular(tags, 2);
        let names: Vec<&str> = ranked.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["react", "python"]);
    }

    #[test]
    fn start_of_day_respects_the_time_zone() {
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        // 2026-03-10 22:30 UTC is already 2026-03-11 03:30 at UTC+5.
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 22, 30, 0).unwrap();
        let start = start_of_day_in(now, &tz);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 19, 0, 0).unwrap());
        assert!(start <= now);
    }
}
