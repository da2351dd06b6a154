use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::model::question::Difficulty;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RequestError {
    #[error("please enter a Wikipedia URL")]
    EmptyUrl,

    #[error("invalid URL provided: {0}")]
    InvalidUrl(String),

    #[error("URL must be a Wikipedia article: {0}")]
    NotWikipedia(String),

    #[error("difficulty must be all, easy, medium, or hard (got {0:?})")]
    InvalidDifficulty(String),
}

/// Which questions the generator should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyFilter {
    #[default]
    All,
    Only(Difficulty),
}

impl DifficultyFilter {
    /// The difficulty to send, or `None` when every difficulty is wanted.
    #[must_use]
    pub fn as_param(self) -> Option<Difficulty> {
        match self {
            Self::All => None,
            Self::Only(d) => Some(d),
        }
    }
}

impl fmt::Display for DifficultyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(d) => d.fmt(f),
        }
    }
}

impl FromStr for DifficultyFilter {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Difficulty>()
            .map(Self::Only)
            .map_err(|_| RequestError::InvalidDifficulty(s.to_owned()))
    }
}

/// Validated input to the quiz generation contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateQuizRequest {
    url: Url,
    difficulty: DifficultyFilter,
    topics: Vec<String>,
}

impl GenerateQuizRequest {
    /// # Errors
    ///
    /// Returns `RequestError` when the URL is blank, unparseable, or not hosted
    /// on `wikipedia.org`.
    pub fn new(raw_url: &str) -> Result<Self, RequestError> {
        let trimmed = raw_url.trim();
        if trimmed.is_empty() {
            return Err(RequestError::EmptyUrl);
        }
        let url = Url::parse(trimmed).map_err(|_| RequestError::InvalidUrl(trimmed.to_owned()))?;
        let is_wikipedia = url
            .host_str()
            .is_some_and(|host| host == "wikipedia.org" || host.ends_with(".wikipedia.org"));
        if !is_wikipedia {
            return Err(RequestError::NotWikipedia(trimmed.to_owned()));
        }

        Ok(Self {
            url,
            difficulty: DifficultyFilter::All,
            topics: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: DifficultyFilter) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics
            .into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyFilter {
        self.difficulty
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }
}
