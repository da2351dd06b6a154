use super::service::SessionState;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub state: SessionState,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub current: usize,
    pub time_left: u32,
}
