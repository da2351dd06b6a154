mod document;
mod ids;
mod leaderboard;
mod question;
mod quiz;
mod request;
mod result;
mod stats;

pub use document::{QuestionDocument, QuizDocument};
pub use ids::{ParseIdError, QuizId, ResultId};
pub use leaderboard::{
    DEFAULT_PLAYER_NAME, LEADERBOARD_SIZE, LEADERBOARD_THRESHOLD, Leaderboard, LeaderboardEntry,
};
pub use question::{Difficulty, MAX_OPTIONS, MIN_OPTIONS, Question, QuestionError};
pub use quiz::{KeyEntities, Quiz, QuizDetails, QuizError};
pub use request::{DifficultyFilter, GenerateQuizRequest, RequestError};
pub use result::{CELEBRATION_THRESHOLD, GOOD_THRESHOLD, PerformanceTier, QuizResult, percent};
pub use stats::{
    AggregateStats, GENERAL_TOPIC, SortDirection, TopicSort, TopicStats, running_mean, topic_name,
};
