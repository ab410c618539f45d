//! crates/qa_community_core/src/voting.rs
//!
//! The vote state machine. Given the vote a user already holds on a target (if any)
//! and the direction they just cast, decide what the store must do and by how much
//! the target's total moves. Stores apply the result under their own write lock.

use crate::domain::{VoteDirection, VoteOutcome};

/// What a store has to do for a single cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteResolution {
    pub outcome: VoteOutcome,
    /// Amount to add to the target's vote total.
    pub delta: i64,
    /// The direction of the vote that remains stored afterwards.
    pub stored: Option<VoteDirection>,
}

pub fn resolve_vote(existing: Option<VoteDirection>, requested: VoteDirection) -> VoteResolution {
    match existing {
        None => VoteResolution {
            outcome: VoteOutcome::Created,
            delta: requested.weight(),
            stored: Some(requested),
        },
        // Repeating the same direction toggles the vote off.
        Some(previous) if previous == requested => VoteResolution {
            outcome: VoteOutcome::Removed,
            delta: -previous.weight(),
            stored: None,
        },
        Some(previous) => VoteResolution {
            outcome: VoteOutcome::Switched,
            delta: requested.weight() - previous.weight(),
            stored: Some(requested),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use VoteDirection::{Down, Up};

    #[test]
    fn fresh_vote_is_created() {
        let up = resolve_vote(None, Up);
        assert_eq!(up.outcome, VoteOutcome::Created);
        assert_eq!(up.delta, 1);
        assert_eq!(up.stored, Some(Up));

        assert_eq!(resolve_vote(None, Down).delta, -1);
    }

    #[test]
    fn same_direction_twice_removes_the_vote() {
        let r = resolve_vote(Some(Up), Up);
        assert_eq!(r.outcome, VoteOutcome::Removed);
        assert_eq!(r.delta, -1);
        assert_eq!(r.stored, None);

        assert_eq!(resolve_vote(Some(Down), Down).delta, 1);
    }

    #[test]
    fn opposite_direction_swings_by_two() {
        let r = resolve_vote(Some(Up), Down);
        assert_eq!(r.outcome, VoteOutcome::Switched);
        assert_eq!(r.delta, -2);
        assert_eq!(r.stored, Some(Down));

        assert_eq!(resolve_vote(Some(Down), Up).delta, 2);
    }

    #[test]
    fn total_always_matches_stored_votes() {
        let casts = [
            (1, Up),
            (2, Down),
            (1, Down),
            (3, Up),
            (1, Down),
            (2, Down),
            (3, Down),
            (2, Up),
            (1, Up),
            (3, Down),
        ];
        let mut stored: HashMap<i64, VoteDirection> = HashMap::new();
        let mut total = 0;

        for (user, direction) in casts {
            let resolution = resolve_vote(stored.get(&user).copied(), direction);
            total += resolution.delta;
            match resolution.stored {
                Some(d) => stored.insert(user, d),
                None => stored.remove(&user),
            };

            let expected: i64 = stored.values().map(VoteDirection::weight).sum();
            assert_eq!(total, expected);
        }
    }
}
