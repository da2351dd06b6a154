use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::ResultId;

/// Percent at or above which a result is rated `Excellent`; also the default
/// celebration threshold of a session.
pub const CELEBRATION_THRESHOLD: u8 = 80;
/// Percent at or above which a result is rated `Good`.
pub const GOOD_THRESHOLD: u8 = 60;

/// `round(100 * correct / total)` with halves rounded up; zero when `total` is zero.
#[must_use]
pub fn percent(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// Feedback band for a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Excellent,
    Good,
    KeepStudying,
}

impl PerformanceTier {
    #[must_use]
    pub fn from_percent(percent: u8) -> Self {
        if percent >= CELEBRATION_THRESHOLD {
            Self::Excellent
        } else if percent >= GOOD_THRESHOLD {
            Self::Good
        } else {
            Self::KeepStudying
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Great job! You really know this topic.",
            Self::Good => "Good work! Keep learning!",
            Self::KeepStudying => "Keep studying and try again!",
        }
    }
}

/// Persisted outcome of one completed session.
///
/// Serialized with the same keys the history list has always used, so
/// previously stored entries remain readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: ResultId,
    pub title: String,
    /// Percent of correct answers, 0..=100.
    pub score: u8,
    #[serde(rename = "totalQuestions")]
    pub total_questions: u32,
    #[serde(rename = "correctAnswers")]
    pub correct_answers: u32,
    /// Whole seconds from start to submission.
    #[serde(rename = "timeTaken")]
    pub time_taken: u64,
    pub date: DateTime<Utc>,
}

impl QuizResult {
    /// Build a result from raw counts; the percent is derived here.
    #[must_use]
    pub fn from_counts(
        title: impl Into<String>,
        correct_answers: u32,
        total_questions: u32,
        time_taken: u64,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ResultId::from_datetime(completed_at),
            title: title.into(),
            score: percent(correct_answers, total_questions),
            total_questions,
            correct_answers,
            time_taken,
            date: completed_at,
        }
    }

    #[must_use]
    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::from_percent(self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(0, 5), 0);
        assert_eq!(percent(5, 5), 100);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn from_counts_derives_score_and_id() {
        let result = QuizResult::from_counts("Rust", 4, 5, 42, fixed_now());
        assert_eq!(result.score, 80);
        assert_eq!(result.id, ResultId::from_datetime(fixed_now()));
        assert_eq!(result.tier(), PerformanceTier::Excellent);
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(PerformanceTier::from_percent(79), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percent(60), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percent(59), PerformanceTier::KeepStudying);
    }

    #[test]
    fn serializes_with_history_keys() {
        let result = QuizResult::from_counts("Rust", 1, 3, 12, fixed_now());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["id"], 1_700_000_000_000_u64);
        assert_eq!(value["score"], 33);
        assert_eq!(value["totalQuestions"], 3);
        assert_eq!(value["correctAnswers"], 1);
        assert_eq!(value["timeTaken"], 12);
        assert_eq!(value["date"], "2023-11-14T22:13:20Z");
    }
}
