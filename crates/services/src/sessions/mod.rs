mod ledger;
mod progress;
mod service;
mod settings;
mod timer;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use ledger::AnswerLedger;
pub use progress::SessionProgress;
pub use service::{CompletionReason, QuizSession, SessionEvent, SessionState};
pub use settings::SessionSettings;
pub use timer::{
    ManualScheduler, QuestionTimer, Scheduler, TickOutcome, TimerFired, TimerKind, TimerToken,
};
