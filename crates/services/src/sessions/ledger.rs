use std::collections::BTreeMap;

use quiz_core::model::Quiz;

/// The option the user picked for each question, keyed by question index.
///
/// The ledger itself does not know about session state; `QuizSession` only
/// lets it change while the session is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    answers: BTreeMap<usize, String>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for `index`, replacing any earlier pick.
    pub fn select(&mut self, index: usize, option: impl Into<String>) {
        self.answers.insert(index, option.into());
    }

    #[must_use]
    pub fn selected(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Whether the pick for `index` matches the question's answer.
    /// Unanswered or out-of-range indices are incorrect.
    #[must_use]
    pub fn is_correct(&self, quiz: &Quiz, index: usize) -> bool {
        match (quiz.question(index), self.selected(index)) {
            (Some(question), Some(option)) => question.is_correct(option),
            _ => false,
        }
    }

    #[must_use]
    pub fn correct_count(&self, quiz: &Quiz) -> u32 {
        let count = (0..quiz.len()).filter(|&i| self.is_correct(quiz, i)).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.answers.iter().map(|(i, o)| (*i, o.as_str()))
    }
}
