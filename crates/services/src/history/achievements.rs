use std::collections::BTreeSet;

use chrono::NaiveDate;

use quiz_core::model::{AggregateStats, QuizResult};

/// Score a result needs to count toward `QuizMaster`.
pub const MASTER_SCORE: u8 = 90;
pub const MASTER_COUNT: usize = 5;
/// Completion time, in seconds, that `SpeedDemon` must beat.
pub const SPEED_LIMIT_SECS: u64 = 120;
pub const EXPLORER_TOPICS: usize = 10;
pub const STREAK_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Achievement {
    FirstQuiz,
    QuizMaster,
    SpeedDemon,
    TopicExplorer,
    StreakBuilder,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Self::FirstQuiz,
        Self::QuizMaster,
        Self::SpeedDemon,
        Self::TopicExplorer,
        Self::StreakBuilder,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::FirstQuiz => "First Quiz",
            Self::QuizMaster => "Quiz Master",
            Self::SpeedDemon => "Speed Demon",
            Self::TopicExplorer => "Topic Explorer",
            Self::StreakBuilder => "Streak Builder",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::FirstQuiz => "Complete your first quiz",
            Self::QuizMaster => "Score 90% or higher on 5 quizzes",
            Self::SpeedDemon => "Complete a quiz in under 2 minutes",
            Self::TopicExplorer => "Take quizzes on 10 different topics",
            Self::StreakBuilder => "Take a quiz on 7 consecutive days",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub unlocked: bool,
}

/// Status of every achievement, in `Achievement::ALL` order.
#[must_use]
pub fn evaluate(history: &[QuizResult], stats: &AggregateStats) -> Vec<AchievementStatus> {
    Achievement::ALL
        .iter()
        .map(|&achievement| AchievementStatus {
            achievement,
            unlocked: is_unlocked(achievement, history, stats),
        })
        .collect()
}

fn is_unlocked(achievement: Achievement, history: &[QuizResult], stats: &AggregateStats) -> bool {
    match achievement {
        Achievement::FirstQuiz => !history.is_empty(),
        Achievement::QuizMaster => {
            history.iter().filter(|r| r.score >= MASTER_SCORE).count() >= MASTER_COUNT
        }
        Achievement::SpeedDemon => history.iter().any(|r| r.time_taken < SPEED_LIMIT_SECS),
        Achievement::TopicExplorer => stats.topics.len() >= EXPLORER_TOPICS,
        Achievement::StreakBuilder => longest_daily_streak(history) >= STREAK_DAYS,
    }
}

/// Longest run of consecutive UTC calendar days with at least one result.
#[must_use]
pub fn longest_daily_streak(history: &[QuizResult]) -> usize {
    let days: BTreeSet<NaiveDate> = history.iter().map(|r| r.date.date_naive()).collect();

    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::TopicStats;
    use quiz_core::time::fixed_now;

    fn on_day(offset: i64, score_of_10: u32, secs: u64) -> QuizResult {
        QuizResult::from_counts("T", score_of_10, 10, secs, fixed_now() + Duration::days(offset))
    }

    fn unlocked(statuses: &[AchievementStatus]) -> Vec<Achievement> {
        statuses
            .iter()
            .filter(|s| s.unlocked)
            .map(|s| s.achievement)
            .collect()
    }

    #[test]
    fn nothing_unlocked_without_history() {
        let statuses = evaluate(&[], &AggregateStats::default());
        assert_eq!(statuses.len(), Achievement::ALL.len());
        assert!(unlocked(&statuses).is_empty());
    }

    #[test]
    fn first_quiz_and_speed() {
        let statuses = evaluate(&[on_day(0, 5, 119)], &AggregateStats::default());
        assert_eq!(
            unlocked(&statuses),
            vec![Achievement::FirstQuiz, Achievement::SpeedDemon]
        );

        let slow = evaluate(&[on_day(0, 5, 120)], &AggregateStats::default());
        assert_eq!(unlocked(&slow), vec![Achievement::FirstQuiz]);
    }

    #[test]
    fn quiz_master_needs_five_high_scores() {
        let mut history: Vec<_> = (0..4).map(|_| on_day(0, 9, 300)).collect();
        history.push(on_day(0, 8, 300));
        assert!(!unlocked(&evaluate(&history, &AggregateStats::default()))
            .contains(&Achievement::QuizMaster));

        history.push(on_day(0, 10, 300));
        assert!(unlocked(&evaluate(&history, &AggregateStats::default()))
            .contains(&Achievement::QuizMaster));
    }

    #[test]
    fn topic_explorer_counts_stats_topics() {
        let stats = AggregateStats {
            topics: (0..10)
                .map(|i| TopicStats {
                    name: format!("t{i}"),
                    quizzes: 1,
                    average_score: 50,
                })
                .collect(),
            ..AggregateStats::default()
        };
        assert!(unlocked(&evaluate(&[], &stats)).contains(&Achievement::TopicExplorer));
    }

    #[test]
    fn streak_ignores_repeats_and_breaks_on_gaps() {
        let history: Vec<_> = [0, 0, 1, 2, 4, 5, 6, 7, 8, 9, 10]
            .into_iter()
            .map(|d| on_day(d, 5, 300))
            .collect();
        assert_eq!(longest_daily_streak(&history), 7);
        assert!(unlocked(&evaluate(&history, &AggregateStats::default()))
            .contains(&Achievement::StreakBuilder));

        assert_eq!(longest_daily_streak(&history[..5]), 3);
    }
}
