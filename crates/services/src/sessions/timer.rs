use std::time::Duration;

/// Handle to a scheduled timer, unique per scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What a timer was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One step of the per-question countdown.
    Tick,
    /// Delayed move to the next question after an answer.
    AutoAdvance,
}

/// A timer that came due, handed back to the session by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub token: TimerToken,
    pub kind: TimerKind,
}

/// Capability to run something later.
///
/// The scheduler never calls into the session itself. The driver owning the
/// event loop collects fired timers and passes them to `QuizSession::on_timer`,
/// which ignores any token it no longer holds.
pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration, kind: TimerKind) -> TimerToken;

    /// Cancel a pending timer. Unknown or already-fired tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}

//
// ─── MANUAL SCHEDULER ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: Duration,
    token: TimerToken,
    kind: TimerKind,
}

/// Virtual-time scheduler driven explicitly by the caller.
///
/// `now` is the offset since the scheduler was created. Timers fire in due
/// order, ties broken by the order they were scheduled in.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_token: u64,
    pending: Vec<Pending>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|p| p.token == token)
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving `now` to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<(Duration, TimerFired)> {
        let (idx, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.token))?;
        let next = self.pending.remove(idx);
        self.now = self.now.max(next.due);
        Some((
            next.due,
            TimerFired {
                token: next.token,
                kind: next.kind,
            },
        ))
    }

    /// Move virtual time forward without firing anything.
    pub fn advance_to(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration, kind: TimerKind) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.pending.push(Pending {
            due: self.now + delay,
            token,
            kind,
        });
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|p| p.token != token);
    }
}

//
// ─── QUESTION TIMER ───────────────────────────────────────────────────────────
//

/// Result of delivering a tick to a `QuestionTimer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The token is not the live tick; nothing changed.
    Stale,
    Running { time_left: u32 },
    Expired,
}

/// Per-question countdown that re-arms itself one tick at a time.
#[derive(Debug, Clone)]
pub struct QuestionTimer {
    seconds_per_question: u32,
    tick_interval: Duration,
    time_left: u32,
    tick: Option<TimerToken>,
}

impl QuestionTimer {
    #[must_use]
    pub fn new(seconds_per_question: u32, tick_interval: Duration) -> Self {
        Self {
            seconds_per_question,
            tick_interval,
            time_left: seconds_per_question,
            tick: None,
        }
    }

    #[must_use]
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }

    /// Give the question a full allowance and arm the first tick.
    pub fn restart<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.stop(scheduler);
        self.time_left = self.seconds_per_question;
        self.tick = Some(scheduler.schedule_after(self.tick_interval, TimerKind::Tick));
    }

    /// Cancel the pending tick, keeping the remaining time.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.tick.take() {
            scheduler.cancel(token);
        }
    }

    /// Cancel the pending tick and restore the full allowance without arming.
    pub fn reset<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.stop(scheduler);
        self.time_left = self.seconds_per_question;
    }

    pub fn on_tick<S: Scheduler + ?Sized>(
        &mut self,
        token: TimerToken,
        scheduler: &mut S,
    ) -> TickOutcome {
        if self.tick != Some(token) {
            return TickOutcome::Stale;
        }
        self.tick = None;
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            return TickOutcome::Expired;
        }
        self.tick = Some(scheduler.schedule_after(self.tick_interval, TimerKind::Tick));
        TickOutcome::Running {
            time_left: self.time_left,
        }
    }
}
