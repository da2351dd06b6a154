use serde::{Deserialize, Serialize};

use crate::model::question::{Difficulty, Question, QuestionError};
use crate::model::quiz::{KeyEntities, Quiz, QuizDetails, QuizError};

/// Wire shape of a generated quiz as returned by the backend.
///
/// Only `quiz` is required for a usable document; every detail field tolerates
/// `null` or absence. Convert with `Quiz::try_from` before starting a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub quiz: Option<Vec<QuestionDocument>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_entities: Option<KeyEntities>,
    #[serde(default)]
    pub sections: Option<Vec<String>>,
    #[serde(default)]
    pub related_topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDocument {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub difficulty: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl TryFrom<QuestionDocument> for Question {
    type Error = QuestionError;

    fn try_from(doc: QuestionDocument) -> Result<Self, Self::Error> {
        let difficulty: Difficulty = doc.difficulty.parse()?;
        Question::new(
            doc.question,
            doc.options,
            doc.answer,
            difficulty,
            doc.explanation.unwrap_or_default(),
        )
    }
}

impl TryFrom<QuizDocument> for Quiz {
    type Error = QuizError;

    fn try_from(doc: QuizDocument) -> Result<Self, Self::Error> {
        let raw = doc.quiz.ok_or(QuizError::MissingQuestions)?;
        let questions = raw
            .into_iter()
            .enumerate()
            .map(|(index, q)| {
                Question::try_from(q).map_err(|source| QuizError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let details = QuizDetails {
            summary: doc.summary.unwrap_or_default(),
            key_entities: doc.key_entities.unwrap_or_default(),
            sections: doc.sections.unwrap_or_default(),
            related_topics: doc.related_topics.unwrap_or_default(),
        };

        Quiz::with_details(doc.title.unwrap_or_default(), questions, details)
    }
}
