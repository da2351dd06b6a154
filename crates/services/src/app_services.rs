use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::Quiz;
use storage::Storage;

use crate::Clock;
use crate::backend::{BackendConfig, HttpQuizBackend, QuizBackend};
use crate::error::AppServicesError;
use crate::history::HistoryService;
use crate::sessions::{QuizSession, Scheduler, SessionSettings};

/// Everything the app needs, wired from one configuration.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: SessionSettings,
    history: Arc<HistoryService>,
    backend: Arc<dyn QuizBackend>,
}

impl AppServices {
    /// Build services backed by a file store under `data_dir` and the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the data directory cannot be created.
    pub fn new_file(
        data_dir: impl Into<PathBuf>,
        backend: BackendConfig,
        player_name: Option<String>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::file(data_dir)?;
        Ok(Self::from_parts(
            storage,
            Arc::new(HttpQuizBackend::new(backend)),
            player_name,
            clock,
        ))
    }

    /// Build services backed by an in-memory store. Useful for tests and demos.
    #[must_use]
    pub fn in_memory(backend: Arc<dyn QuizBackend>, clock: Clock) -> Self {
        Self::from_parts(Storage::in_memory(), backend, None, clock)
    }

    #[must_use]
    pub fn from_parts(
        storage: Storage,
        backend: Arc<dyn QuizBackend>,
        player_name: Option<String>,
        clock: Clock,
    ) -> Self {
        let mut history = HistoryService::new(Arc::clone(&storage.kv));
        if let Some(name) = player_name {
            history = history.with_player_name(name);
        }
        Self {
            clock,
            settings: SessionSettings::default(),
            history: Arc::new(history),
            backend,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Open a session on `quiz` that schedules its timers on `scheduler`.
    #[must_use]
    pub fn new_session<S: Scheduler>(&self, quiz: Quiz, scheduler: S) -> QuizSession<S> {
        QuizSession::new(quiz, Arc::clone(&self.history), self.clock, scheduler)
            .with_settings(self.settings)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn QuizBackend> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }
}
