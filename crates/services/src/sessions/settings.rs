use std::time::Duration;

use quiz_core::model::CELEBRATION_THRESHOLD;

/// Timing knobs for a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Countdown each question starts from, in ticks.
    pub seconds_per_question: u32,
    pub tick_interval: Duration,
    /// Delay between selecting an answer and moving on.
    pub auto_advance_delay: Duration,
    /// Percent at or above which completion emits `Celebrate`.
    pub celebration_threshold: u8,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seconds_per_question: 30,
            tick_interval: Duration::from_secs(1),
            auto_advance_delay: Duration::from_secs(1),
            celebration_threshold: CELEBRATION_THRESHOLD,
        }
    }
}
