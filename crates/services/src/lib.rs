#![forbid(unsafe_code)]

pub mod app_services;
pub mod backend;
mod coerce;
pub mod error;
pub mod history;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use backend::{BackendConfig, HttpQuizBackend, QuizBackend, RemoteQuizSummary};
pub use error::{
    AppServicesError, BackendError, PersistenceError, PersistenceTarget, PersistenceWarning,
    SessionError,
};
pub use history::{Achievement, AchievementStatus, HistoryService, RecordOutcome};

pub use sessions::{
    CompletionReason, ManualScheduler, QuizSession, Scheduler, SessionEvent, SessionProgress,
    SessionSettings, SessionState, TimerFired, TimerKind, TimerToken,
};
