use std::collections::HashMap;
use std::time::Duration;

use services::{Scheduler, TimerFired, TimerKind, TimerToken};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

/// Runs session timers as sleeping tokio tasks.
///
/// Fired timers arrive on the receiver returned by `channel`; the event loop
/// passes them to the session. Cancelling aborts the task, and dropping the
/// scheduler aborts everything still pending.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TimerFired>,
    next_token: u64,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioScheduler {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            next_token: 0,
            tasks: HashMap::new(),
        };
        (scheduler, rx)
    }

    /// Timers scheduled and neither fired nor cancelled.
    pub fn pending_count(&mut self) -> usize {
        self.prune();
        self.tasks.len()
    }

    fn prune(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&mut self, delay: Duration, kind: TimerKind) -> TimerToken {
        self.prune();
        self.next_token += 1;
        let token = TimerToken::new(self.next_token);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            // The receiver is gone once the shell exits.
            let _ = tx.send(TimerFired { token, kind });
        });
        self.tasks.insert(token, handle);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.tasks.remove(&token) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}
