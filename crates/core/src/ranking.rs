//! Leaderboard ordering
//!
//! Rows are ranked by points (descending), then by time taken (ascending).
//! The sort is stable, so rows that tie on both keys keep the order the
//! store yielded them in, which is insertion order for every backend.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::types::{JoinedResult, LeaderboardEntry};

/// Compare two rows by leaderboard rank; `Less` means `a` ranks higher.
pub fn compare_rank(a: &JoinedResult, b: &JoinedResult) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.time_taken.total_cmp(&b.time_taken))
}

/// Rank every submission; a user with several results gets several rows.
pub fn rank(mut rows: Vec<JoinedResult>) -> Vec<LeaderboardEntry> {
    rows.sort_by(compare_rank);
    rows.into_iter().map(LeaderboardEntry::from).collect()
}

/// Rank keeping only the best row of each user
pub fn rank_best_per_user(mut rows: Vec<JoinedResult>) -> Vec<LeaderboardEntry> {
    rows.sort_by(compare_rank);
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.user_id.clone()))
        .map(LeaderboardEntry::from)
        .collect()
}
