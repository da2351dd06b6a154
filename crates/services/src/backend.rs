//! Client for the quiz generation backend.

use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};

use quiz_core::model::{Difficulty, GenerateQuizRequest, Quiz, QuizDocument, QuizId};

use crate::coerce;
use crate::error::BackendError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8002/api";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
}

impl BackendConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Reads `QUIZ_API_BASE_URL`, falling back to the local development server.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Self::new(base_url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// A quiz previously generated and stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQuizSummary {
    pub id: QuizId,
    pub url: String,
    pub title: String,
    pub date_generated: Option<DateTime<Utc>>,
}

/// The generation contract. Failures carry a message fit for the user.
///
/// Nothing is retried; callers decide whether to ask again.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn generate_quiz(&self, request: &GenerateQuizRequest) -> Result<Quiz, BackendError>;

    async fn list_history(&self) -> Result<Vec<RemoteQuizSummary>, BackendError>;

    async fn fetch_quiz(&self, id: QuizId) -> Result<Quiz, BackendError>;
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    topics: &'a [String],
}

impl<'a> GenerateBody<'a> {
    fn from_request(request: &'a GenerateQuizRequest) -> Self {
        Self {
            url: request.url().as_str(),
            difficulty: request.difficulty().as_param(),
            topics: request.topics(),
        }
    }
}

/// `QuizBackend` over HTTP with the `{success, data, message, error}` envelope.
#[derive(Clone)]
pub struct HttpQuizBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpQuizBackend {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(BackendConfig::from_env())
    }

    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        failure: &str,
    ) -> Result<Value, BackendError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        open_envelope(status, &body, failure)
    }

    fn transport_error(&self, error: reqwest::Error) -> BackendError {
        if error.is_connect() || error.is_timeout() {
            log::warn!("backend at {} unreachable: {error}", self.config.base_url);
            BackendError::Unreachable {
                base_url: self.config.base_url.clone(),
            }
        } else {
            BackendError::Http(error)
        }
    }
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn generate_quiz(&self, request: &GenerateQuizRequest) -> Result<Quiz, BackendError> {
        log::info!("generating quiz for {}", request.url());
        let body = GenerateBody::from_request(request);
        let call = self
            .client
            .post(self.config.endpoint("generate_quiz"))
            .json(&body);
        let data = self.send(call, "Failed to generate quiz").await?;
        quiz_from_data(data)
    }

    async fn list_history(&self) -> Result<Vec<RemoteQuizSummary>, BackendError> {
        let call = self.client.get(self.config.endpoint("history"));
        let data = self.send(call, "Failed to fetch quiz history").await?;
        Ok(summaries_from_data(&data))
    }

    async fn fetch_quiz(&self, id: QuizId) -> Result<Quiz, BackendError> {
        let call = self.client.get(self.config.endpoint(&format!("quiz/{id}")));
        let data = self.send(call, "Failed to fetch quiz").await?;
        quiz_from_data(data)
    }
}

//
// ─── ENVELOPE ─────────────────────────────────────────────────────────────────
//

fn first_message(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key)?.as_str())
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_owned)
}

/// Check status and envelope, returning the `data` payload.
fn open_envelope(status: u16, body: &str, failure: &str) -> Result<Value, BackendError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| first_message(&v, &["error", "message", "detail"]))
            .unwrap_or_else(|| format!("HTTP Error: {status}"));
        return Err(BackendError::Rejected {
            status: Some(status),
            message,
        });
    }
    if body.trim().is_empty() {
        return Err(BackendError::InvalidResponse);
    }
    let value: Value = serde_json::from_str(body).map_err(|_| BackendError::InvalidJson)?;
    let Value::Object(mut envelope) = value else {
        return Err(BackendError::InvalidResponse);
    };

    let succeeded = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !succeeded {
        let message = first_message(&Value::Object(envelope), &["error", "message"])
            .unwrap_or_else(|| failure.to_owned());
        return Err(BackendError::Rejected {
            status: None,
            message,
        });
    }
    Ok(match envelope.remove("data") {
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(data) => data,
    })
}

fn quiz_from_data(data: Value) -> Result<Quiz, BackendError> {
    let document: QuizDocument =
        serde_json::from_value(data).map_err(|_| BackendError::InvalidResponse)?;
    Ok(Quiz::try_from(document)?)
}

/// Entries without a usable id are skipped.
fn summaries_from_data(data: &Value) -> Vec<RemoteQuizSummary> {
    let Some(items) = data.get("quizzes").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let id = coerce::canonical_id(obj)?;
            let text = |key: &str| {
                obj.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned()
            };
            Some(RemoteQuizSummary {
                id: QuizId::new(id),
                url: text("url"),
                title: text("title"),
                date_generated: coerce::parse_datetime(obj.get("date_generated")),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{DifficultyFilter, QuizError};
    use serde_json::json;

    const QUIZ_DATA: &str = r#"{
        "success": true,
        "message": "Quiz generated successfully",
        "data": {
            "id": 4,
            "url": "https://en.wikipedia.org/wiki/Alan_Turing",
            "title": "Alan Turing",
            "summary": "Mathematician.",
            "key_entities": {"people": ["Alan Turing"], "organizations": [], "locations": ["London"]},
            "sections": ["Early life"],
            "quiz": [
                {"question": "Where was Turing born?", "options": ["London", "Paris", "Rome", "Oslo"],
                 "answer": "London", "difficulty": "easy", "explanation": "Maida Vale, London."}
            ],
            "related_topics": ["Enigma"]
        }
    }"#;

    #[test]
    fn successful_envelope_yields_quiz() {
        let data = open_envelope(200, QUIZ_DATA, "Failed").unwrap();
        let quiz = quiz_from_data(data).unwrap();
        assert_eq!(quiz.title(), "Alan Turing");
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.details().related_topics, vec!["Enigma".to_owned()]);
    }

    #[test]
    fn http_errors_use_server_message() {
        let err = open_envelope(404, r#"{"detail": "Quiz not found"}"#, "Failed").unwrap_err();
        assert!(matches!(
            &err,
            BackendError::Rejected { status: Some(404), message } if message == "Quiz not found"
        ));

        let err = open_envelope(502, "<html>", "Failed").unwrap_err();
        assert_eq!(err.to_string(), "HTTP Error: 502");
    }

    #[test]
    fn unsuccessful_envelope_is_rejected() {
        let err = open_envelope(200, r#"{"success": false, "error": "scrape failed"}"#, "Failed")
            .unwrap_err();
        assert_eq!(err.to_string(), "scrape failed");

        let err = open_envelope(200, r#"{"success": false}"#, "Failed to fetch quiz").unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch quiz");
    }

    #[test]
    fn malformed_bodies_are_reported() {
        assert!(matches!(
            open_envelope(200, "{oops", "Failed"),
            Err(BackendError::InvalidJson)
        ));
        assert!(matches!(
            open_envelope(200, "", "Failed"),
            Err(BackendError::InvalidResponse)
        ));
        assert!(matches!(
            open_envelope(200, "[1]", "Failed"),
            Err(BackendError::InvalidResponse)
        ));
    }

    #[test]
    fn quiz_without_questions_is_invalid() {
        let data = open_envelope(200, r#"{"success": true, "data": {"title": "x"}}"#, "F").unwrap();
        assert!(matches!(
            quiz_from_data(data),
            Err(BackendError::InvalidQuiz(QuizError::MissingQuestions))
        ));
    }

    #[test]
    fn history_summaries_normalize_ids() {
        let data = json!({"quizzes": [
            {"id": 3, "url": "u", "title": "A", "date_generated": "2024-03-01T10:00:00.5"},
            {"quizId": "8", "title": "B"},
            {"title": "no id"}
        ]});
        let summaries = summaries_from_data(&data);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, QuizId::new(3));
        assert!(summaries[0].date_generated.is_some());
        assert_eq!(summaries[1].id, QuizId::new(8));
        assert_eq!(summaries[1].url, "");

        assert!(summaries_from_data(&json!({})).is_empty());
    }

    #[test]
    fn generate_body_omits_all_and_empty_topics() {
        let request = GenerateQuizRequest::new("https://en.wikipedia.org/wiki/Rust").unwrap();
        let body = serde_json::to_value(GenerateBody::from_request(&request)).unwrap();
        assert_eq!(body, json!({"url": "https://en.wikipedia.org/wiki/Rust"}));

        let request = request
            .with_difficulty(DifficultyFilter::Only(Difficulty::Hard))
            .with_topics(vec!["history".into()]);
        let body = serde_json::to_value(GenerateBody::from_request(&request)).unwrap();
        assert_eq!(body["difficulty"], "hard");
        assert_eq!(body["topics"], json!(["history"]));
    }

    #[test]
    fn config_trims_trailing_slash() {
        let config = BackendConfig::new("http://example.test/api/");
        assert_eq!(config.endpoint("history"), "http://example.test/api/history");
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let backend = HttpQuizBackend::new(BackendConfig::new("http://127.0.0.1:1/api"));
        let err = backend.list_history().await.unwrap_err();
        assert!(matches!(err, BackendError::Unreachable { .. }));
        assert!(err.to_string().contains("http://127.0.0.1:1/api"));
    }
}
