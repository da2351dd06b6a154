use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::result::QuizResult;

/// Topic used for results whose quiz title is blank.
pub const GENERAL_TOPIC: &str = "General";

/// Incremental rounded mean: `round((old_avg * old_count + value) / (old_count + 1))`.
///
/// The previous average is already rounded, so repeated folds drift from the
/// exact mean of all values. That approximation is accepted.
#[must_use]
pub fn running_mean(old_avg: u32, old_count: u64, value: u32) -> u32 {
    let new_count = u128::from(old_count) + 1;
    let sum = u128::from(old_avg) * u128::from(old_count) + u128::from(value);
    let rounded = (2 * sum + new_count) / (2 * new_count);
    u32::try_from(rounded.min(100)).unwrap_or(100)
}

/// Grouping key for a quiz title.
#[must_use]
pub fn topic_name(title: &str) -> &str {
    if title.trim().is_empty() {
        GENERAL_TOPIC
    } else {
        title
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub name: String,
    pub quizzes: u64,
    pub average_score: u32,
}

/// Running summary of every completed session, folded one result at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_quizzes: u64,
    pub average_score: u32,
    /// Seconds across all sessions.
    pub total_time: u64,
    pub topics: Vec<TopicStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicSort {
    #[default]
    Name,
    Quizzes,
    AverageScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl AggregateStats {
    /// Fold a newly completed result into the totals and its topic entry.
    pub fn fold(&mut self, result: &QuizResult) {
        let percent = u32::from(result.score);

        self.average_score = running_mean(self.average_score, self.total_quizzes, percent);
        self.total_quizzes = self.total_quizzes.saturating_add(1);
        self.total_time = self.total_time.saturating_add(result.time_taken);

        let name = topic_name(&result.title);
        match self.topics.iter_mut().find(|t| t.name == name) {
            Some(topic) => {
                topic.average_score = running_mean(topic.average_score, topic.quizzes, percent);
                topic.quizzes = topic.quizzes.saturating_add(1);
            }
            None => self.topics.push(TopicStats {
                name: name.to_owned(),
                quizzes: 1,
                average_score: percent,
            }),
        }
    }

    #[must_use]
    pub fn topic(&self, name: &str) -> Option<&TopicStats> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Highest per-topic average, or zero with no topics.
    #[must_use]
    pub fn best_score(&self) -> u32 {
        self.topics
            .iter()
            .map(|t| t.average_score)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn sorted_topics(&self, sort: TopicSort, direction: SortDirection) -> Vec<&TopicStats> {
        let mut topics: Vec<&TopicStats> = self.topics.iter().collect();
        topics.sort_by(|a, b| {
            let ord = match sort {
                TopicSort::Name => compare_names(&a.name, &b.name),
                TopicSort::Quizzes => a.quizzes.cmp(&b.quizzes),
                TopicSort::AverageScore => a.average_score.cmp(&b.average_score),
            };
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        topics
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
