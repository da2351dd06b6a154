use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use quiz_core::Clock;
use quiz_core::model::{Question, Quiz, QuizDocument, QuizResult};
use quiz_core::time::elapsed_whole_seconds;

use crate::error::{PersistenceWarning, SessionError};
use crate::history::HistoryService;
use crate::sessions::ledger::AnswerLedger;
use crate::sessions::progress::SessionProgress;
use crate::sessions::settings::SessionSettings;
use crate::sessions::timer::{
    ManualScheduler, QuestionTimer, Scheduler, TickOutcome, TimerFired, TimerKind, TimerToken,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Preview,
    InProgress,
    Completed,
}

/// Why a session left `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    Submitted,
    /// The last question ran out of time.
    TimeExpired,
}

/// Notifications for the presentation layer, drained with `QuizSession::drain_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    QuestionChanged {
        index: usize,
    },
    QuestionExpired {
        index: usize,
    },
    Completed {
        result: QuizResult,
        reason: CompletionReason,
        /// The result earned a leaderboard entry.
        ranked: bool,
    },
    /// Cosmetic signal for a high score.
    Celebrate {
        percent: u8,
    },
    PersistenceWarning(PersistenceWarning),
}

/// One attempt at a quiz: `Preview`, then `InProgress`, then `Completed`.
///
/// The session never waits on anything. Timers are requested from the
/// scheduler it owns, and whoever drives the event loop hands fired timers
/// back through `on_timer`. A timer that arrives after the session moved on
/// (other question, other state, cancelled) is ignored.
pub struct QuizSession<S: Scheduler> {
    quiz: Quiz,
    history: Arc<HistoryService>,
    clock: Clock,
    scheduler: S,
    settings: SessionSettings,
    state: SessionState,
    current: usize,
    timer: QuestionTimer,
    auto_advance: Option<TimerToken>,
    ledger: AnswerLedger,
    started_at: Option<DateTime<Utc>>,
    result: Option<QuizResult>,
    events: Vec<SessionEvent>,
}

impl<S: Scheduler> QuizSession<S> {
    #[must_use]
    pub fn new(quiz: Quiz, history: Arc<HistoryService>, clock: Clock, scheduler: S) -> Self {
        let settings = SessionSettings::default();
        Self {
            quiz,
            history,
            clock,
            scheduler,
            settings,
            state: SessionState::Preview,
            current: 0,
            timer: QuestionTimer::new(settings.seconds_per_question, settings.tick_interval),
            auto_advance: None,
            ledger: AnswerLedger::new(),
            started_at: None,
            result: None,
            events: Vec::new(),
        }
    }

    /// Validate a generated document and open a session on it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidQuiz` if the document has no usable questions.
    pub fn from_document(
        document: QuizDocument,
        history: Arc<HistoryService>,
        clock: Clock,
        scheduler: S,
    ) -> Result<Self, SessionError> {
        let quiz = Quiz::try_from(document)?;
        Ok(Self::new(quiz, history, clock, scheduler))
    }

    /// Replace the session settings. Only takes effect before `start`.
    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        if self.state == SessionState::Preview {
            self.settings = settings;
            self.timer = QuestionTimer::new(settings.seconds_per_question, settings.tick_interval);
        }
        self
    }

    //
    // ─── TRANSITIONS ──────────────────────────────────────────────────────────
    //

    /// Leave the preview and start the first question's countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is in `Preview`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Preview {
            return Err(SessionError::AlreadyStarted { state: self.state });
        }
        self.begin();
        Ok(())
    }

    /// Deliver a fired timer.
    pub fn on_timer(&mut self, fired: TimerFired) {
        if self.state != SessionState::InProgress {
            log::debug!("ignoring {:?} timer in {:?}", fired.kind, self.state);
            return;
        }
        match fired.kind {
            TimerKind::Tick => match self.timer.on_tick(fired.token, &mut self.scheduler) {
                TickOutcome::Stale => log::debug!("ignoring stale tick {}", fired.token.value()),
                TickOutcome::Running { .. } => {}
                TickOutcome::Expired => self.expire_current(),
            },
            TimerKind::AutoAdvance => {
                if self.auto_advance != Some(fired.token) {
                    log::debug!("ignoring stale auto-advance {}", fired.token.value());
                    return;
                }
                self.auto_advance = None;
                if self.current < self.quiz.last_index() {
                    self.move_to(self.current + 1);
                }
            }
        }
    }

    /// Jump to a question. Out-of-range indices are clamped.
    ///
    /// Always restarts the countdown, even when staying on the same question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`; nothing changes.
    pub fn go_to_question(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.move_to(index.min(self.quiz.last_index()));
        Ok(())
    }

    /// Step forward. Does nothing on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn next_question(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if self.current < self.quiz.last_index() {
            self.move_to(self.current + 1);
        }
        Ok(())
    }

    /// Step back. Does nothing on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn previous_question(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if self.current > 0 {
            self.move_to(self.current - 1);
        }
        Ok(())
    }

    /// Record `option` as the answer to question `index`.
    ///
    /// Unless the current question is the last one, this also schedules a
    /// move to the next question, replacing any move already pending.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`,
    /// `SessionError::QuestionOutOfRange` for a bad index and
    /// `SessionError::UnknownOption` if `option` is not one of the question's options.
    pub fn select_answer(&mut self, index: usize, option: &str) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let question = self
            .quiz
            .question(index)
            .ok_or(SessionError::QuestionOutOfRange {
                index,
                len: self.quiz.len(),
            })?;
        if !question.has_option(option) {
            return Err(SessionError::UnknownOption {
                index,
                option: option.to_owned(),
            });
        }
        self.ledger.select(index, option);

        self.cancel_auto_advance();
        if self.current < self.quiz.last_index() {
            self.auto_advance = Some(
                self.scheduler
                    .schedule_after(self.settings.auto_advance_delay, TimerKind::AutoAdvance),
            );
        }
        Ok(())
    }

    /// Score the attempt and record it.
    ///
    /// Calling again after completion returns the same result and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` while still in `Preview`.
    pub fn submit(&mut self) -> Result<&QuizResult, SessionError> {
        match self.state {
            SessionState::Preview => return Err(SessionError::NotStarted),
            SessionState::InProgress => self.complete(CompletionReason::Submitted),
            SessionState::Completed => {}
        }
        self.result.as_ref().ok_or(SessionError::NotCompleted)
    }

    /// Start over on the same quiz after completing it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` unless the session is `Completed`.
    pub fn retake(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Completed {
            return Err(SessionError::NotCompleted);
        }
        self.begin();
        Ok(())
    }

    /// Drop the attempt and return to the preview. Nothing is recorded.
    pub fn abandon(&mut self) {
        self.cancel_timers();
        self.timer.reset(&mut self.scheduler);
        self.ledger.clear();
        self.result = None;
        self.started_at = None;
        self.current = 0;
        self.state = SessionState::Preview;
    }

    //
    // ─── QUERIES ──────────────────────────────────────────────────────────────
    //

    /// Whether the answer to `index` was right. Only known once completed;
    /// unanswered questions count as wrong.
    #[must_use]
    pub fn is_correct(&self, index: usize) -> Option<bool> {
        if self.state != SessionState::Completed {
            return None;
        }
        self.quiz.question(index)?;
        Some(self.ledger.is_correct(&self.quiz, index))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.quiz.len();
        let answered = self.ledger.answered_count();
        SessionProgress {
            state: self.state,
            total,
            answered,
            remaining: total.saturating_sub(answered),
            current: self.current,
            time_left: self.timer.time_left(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.question(self.current)
    }

    #[must_use]
    pub fn time_left(&self) -> u32 {
        self.timer.time_left()
    }

    #[must_use]
    pub fn selected(&self, index: usize) -> Option<&str> {
        self.ledger.selected(index)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    #[must_use]
    pub fn has_pending_auto_advance(&self) -> bool {
        self.auto_advance.is_some()
    }

    //
    // ─── INTERNALS ────────────────────────────────────────────────────────────
    //

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.state == SessionState::InProgress {
            Ok(())
        } else {
            Err(SessionError::NotInProgress { state: self.state })
        }
    }

    fn begin(&mut self) {
        self.cancel_timers();
        self.ledger.clear();
        self.result = None;
        self.current = 0;
        self.started_at = Some(self.clock.now());
        self.state = SessionState::InProgress;
        self.timer.restart(&mut self.scheduler);
        self.events.push(SessionEvent::Started);
        self.events.push(SessionEvent::QuestionChanged { index: 0 });
    }

    fn move_to(&mut self, index: usize) {
        self.cancel_auto_advance();
        self.current = index;
        self.timer.restart(&mut self.scheduler);
        self.events.push(SessionEvent::QuestionChanged { index });
    }

    fn expire_current(&mut self) {
        let index = self.current;
        self.events.push(SessionEvent::QuestionExpired { index });
        if index < self.quiz.last_index() {
            self.move_to(index + 1);
        } else {
            self.complete(CompletionReason::TimeExpired);
        }
    }

    fn complete(&mut self, reason: CompletionReason) {
        self.cancel_timers();
        self.state = SessionState::Completed;

        let now = self.clock.now();
        let time_taken = self
            .started_at
            .map_or(0, |started| elapsed_whole_seconds(started, now));
        let total = u32::try_from(self.quiz.len()).unwrap_or(u32::MAX);
        let correct = self.ledger.correct_count(&self.quiz);
        let result = QuizResult::from_counts(self.quiz.title(), correct, total, time_taken, now);

        let outcome = self.history.record_result(result);
        log::info!(
            "quiz {:?} completed ({reason:?}): {}/{} correct, {}% in {}s",
            outcome.result.title,
            outcome.result.correct_answers,
            outcome.result.total_questions,
            outcome.result.score,
            outcome.result.time_taken
        );

        self.events.push(SessionEvent::Completed {
            result: outcome.result.clone(),
            reason,
            ranked: outcome.leaderboard_entry,
        });
        if outcome.result.score >= self.settings.celebration_threshold {
            self.events.push(SessionEvent::Celebrate {
                percent: outcome.result.score,
            });
        }
        self.events.extend(
            outcome
                .warnings
                .into_iter()
                .map(SessionEvent::PersistenceWarning),
        );
        self.result = Some(outcome.result);
    }

    fn cancel_auto_advance(&mut self) {
        if let Some(token) = self.auto_advance.take() {
            self.scheduler.cancel(token);
        }
    }

    fn cancel_timers(&mut self) {
        self.cancel_auto_advance();
        self.timer.stop(&mut self.scheduler);
    }
}

impl<S: Scheduler> Drop for QuizSession<S> {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

impl QuizSession<ManualScheduler> {
    /// Move virtual time forward by `by`, delivering every timer that comes
    /// due on the way. A fixed clock is advanced in step.
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now() + by;
        loop {
            let before = self.scheduler.now();
            let Some((due, fired)) = self.scheduler.pop_due(until) else {
                break;
            };
            self.advance_clock(due.saturating_sub(before));
            self.on_timer(fired);
        }
        let before = self.scheduler.now();
        self.scheduler.advance_to(until);
        self.advance_clock(until.saturating_sub(before));
    }

    fn advance_clock(&mut self, by: Duration) {
        if let Ok(delta) = chrono::Duration::from_std(by) {
            self.clock.advance(delta);
        }
    }
}
