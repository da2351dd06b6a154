use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::time::epoch_millis;

/// Identifier of a locally recorded quiz result.
///
/// Derived from the completion time in milliseconds since the epoch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(u64);

impl ResultId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Timestamp-based id for a result completed at `at`.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(epoch_millis(at))
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The smallest id strictly greater than this one.
    #[must_use]
    pub fn successor(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Identifier the generation backend assigns to a stored quiz.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(u64);

impl QuizId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResultId({})", self.0)
    }
}

impl fmt::Debug for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizId({})", self.0)
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an id from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ResultId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ResultId::new)
            .map_err(|_| ParseIdError { kind: "ResultId" })
    }
}

impl FromStr for QuizId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(QuizId::new)
            .map_err(|_| ParseIdError { kind: "QuizId" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn result_id_is_millis_of_completion() {
        let id = ResultId::from_datetime(fixed_now());
        assert_eq!(id.value(), 1_700_000_000_000);
        assert_eq!(id.successor().value(), 1_700_000_000_001);
    }

    #[test]
    fn quiz_id_parses_with_whitespace() {
        let id: QuizId = " 17 ".parse().unwrap();
        assert_eq!(id, QuizId::new(17));
        assert_eq!(id.to_string(), "17");
    }

    #[test]
    fn invalid_id_is_rejected() {
        let err = "abc".parse::<ResultId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse ResultId from string");
    }
}
