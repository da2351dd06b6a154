use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fewest options a multiple-choice question may offer.
pub const MIN_OPTIONS: usize = 2;
/// Most options a multiple-choice question may offer.
pub const MAX_OPTIONS: usize = 4;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("question has {len} options, at least {MIN_OPTIONS} required")]
    TooFewOptions { len: usize },

    #[error("question has {len} options, at most {MAX_OPTIONS} allowed")]
    TooManyOptions { len: usize },

    #[error("answer {answer:?} is not one of the options")]
    AnswerNotInOptions { answer: String },

    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

/// Difficulty label the generator attaches to each question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(QuestionError::UnknownDifficulty(s.to_owned())),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question. The answer is always one of the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<String>,
    answer: String,
    difficulty: Difficulty,
    explanation: String,
}

impl Question {
    /// Build a question, enforcing the option count and `answer ∈ options`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, the option count is out of
    /// range, or the answer does not match any option exactly.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        answer: impl Into<String>,
        difficulty: Difficulty,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let answer = answer.into();

        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }
        if options.len() > MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions { len: options.len() });
        }
        if !options.iter().any(|option| *option == answer) {
            return Err(QuestionError::AnswerNotInOptions { answer });
        }

        Ok(Self {
            text,
            options,
            answer,
            difficulty,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.answer == option
    }

    /// Letter shown next to the option at `index` (`A`..`D`).
    #[must_use]
    pub fn option_label(index: usize) -> Option<char> {
        (index < MAX_OPTIONS).then(|| char::from(b'A' + index as u8))
    }
}
