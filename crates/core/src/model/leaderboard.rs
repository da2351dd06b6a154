use serde::{Deserialize, Serialize};

use crate::model::ids::ResultId;
use crate::model::result::QuizResult;

/// Percent a result needs to earn a leaderboard entry.
pub const LEADERBOARD_THRESHOLD: u8 = 85;
/// Entries kept on the board.
pub const LEADERBOARD_SIZE: usize = 10;
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: ResultId,
    pub name: String,
    pub score: u8,
    pub quizzes: u32,
}

/// Local high-score board, best score first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Rebuild from stored entries, restoring order and size limits.
    #[must_use]
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(LEADERBOARD_SIZE);
        Self { entries }
    }

    #[must_use]
    pub fn qualifies(result: &QuizResult) -> bool {
        result.score >= LEADERBOARD_THRESHOLD
    }

    /// Insert an entry for `result` if it qualifies. Returns whether the board changed.
    ///
    /// Ties keep earlier entries ahead of the newcomer.
    pub fn record(&mut self, result: &QuizResult, player: &str) -> bool {
        if !Self::qualifies(result) {
            return false;
        }
        self.entries.push(LeaderboardEntry {
            id: result.id,
            name: player.to_owned(),
            score: result.score,
            quizzes: 1,
        });
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(LEADERBOARD_SIZE);
        self.entries.iter().any(|e| e.id == result.id)
    }

    #[must_use]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn result(score: u8, offset_ms: i64) -> QuizResult {
        let mut r =
            QuizResult::from_counts("T", 1, 1, 1, fixed_now() + Duration::milliseconds(offset_ms));
        r.score = score;
        r
    }

    #[test]
    fn low_scores_are_skipped() {
        let mut board = Leaderboard::default();
        assert!(!board.record(&result(84, 0), DEFAULT_PLAYER_NAME));
        assert!(board.entries().is_empty());
    }

    #[test]
    fn keeps_top_ten_sorted() {
        let mut board = Leaderboard::default();
        for i in 0..12 {
            board.record(&result(85 + (i % 10) as u8, i64::from(i)), "p");
        }
        assert_eq!(board.entries().len(), LEADERBOARD_SIZE);
        assert_eq!(board.entries()[0].score, 94);
        assert!(board.entries().windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_existing_entries_first() {
        let mut board = Leaderboard::default();
        let first = result(90, 0);
        let second = result(90, 1);
        board.record(&first, "a");
        board.record(&second, "b");
        assert_eq!(board.entries()[0].id, first.id);
        assert_eq!(board.entries()[1].name, "b");
    }
}
