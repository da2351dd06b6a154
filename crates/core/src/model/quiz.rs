use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::{Question, QuestionError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz document has no questions array")]
    MissingQuestions,

    #[error("quiz has no questions")]
    Empty,

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Named entities the generator extracted from the source article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntities {
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Article context shipped alongside the questions. Purely informational.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizDetails {
    pub summary: String,
    pub key_entities: KeyEntities,
    pub sections: Vec<String>,
    pub related_topics: Vec<String>,
}

/// An immutable quiz: a title plus at least one validated question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    title: String,
    questions: Vec<Question>,
    details: QuizDetails,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::Empty` when `questions` is empty.
    pub fn new(title: impl Into<String>, questions: Vec<Question>) -> Result<Self, QuizError> {
        Self::with_details(title, questions, QuizDetails::default())
    }

    /// # Errors
    ///
    /// Returns `QuizError::Empty` when `questions` is empty.
    pub fn with_details(
        title: impl Into<String>,
        questions: Vec<Question>,
        details: QuizDetails,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self {
            title: title.into(),
            questions,
            details,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.questions.len() - 1
    }

    #[must_use]
    pub fn details(&self) -> &QuizDetails {
        &self.details
    }
}
