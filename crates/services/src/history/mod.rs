mod achievements;
mod service;

pub use achievements::{Achievement, AchievementStatus, longest_daily_streak};
pub use service::{HISTORY_KEY, HistoryService, LEADERBOARD_KEY, RecordOutcome, STATS_KEY};
