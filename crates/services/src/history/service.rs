use std::sync::Arc;

use serde_json::{Map, Value};

use quiz_core::model::{AggregateStats, DEFAULT_PLAYER_NAME, Leaderboard, QuizResult};
use storage::{KeyValueStore, StorageError};

use crate::coerce;
use crate::error::{PersistenceError, PersistenceTarget, PersistenceWarning};
use crate::history::achievements::{self, AchievementStatus};

/// Store key of the result history (JSON array of results, oldest first).
pub const HISTORY_KEY: &str = "quizHistory";
/// Store key of the aggregate statistics object.
pub const STATS_KEY: &str = "quizStats";
/// Store key of the local leaderboard (JSON array, best first).
pub const LEADERBOARD_KEY: &str = "leaderboard";

/// What happened when a result was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The result as stored; its id may have been bumped to stay unique.
    pub result: QuizResult,
    /// One entry per persistence step that failed.
    pub warnings: Vec<PersistenceWarning>,
    /// Whether the result earned a place on the leaderboard.
    pub leaderboard_entry: bool,
}

impl RecordOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Appends completed results to local history and keeps the derived
/// statistics and leaderboard in step.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn KeyValueStore>,
    player_name: String,
}

impl HistoryService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            player_name: DEFAULT_PLAYER_NAME.to_owned(),
        }
    }

    /// Name written on leaderboard entries. Blank names fall back to the default.
    #[must_use]
    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        self.player_name = if trimmed.is_empty() {
            DEFAULT_PLAYER_NAME.to_owned()
        } else {
            trimmed.to_owned()
        };
        self
    }

    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Persist a completed result.
    ///
    /// History, statistics and leaderboard are updated as independent steps.
    /// A failing step is reported in `RecordOutcome::warnings` and never stops
    /// the steps after it.
    pub fn record_result(&self, result: QuizResult) -> RecordOutcome {
        let mut result = result;
        let mut warnings = Vec::new();

        if let Err(e) = self.append_history(&mut result) {
            warnings.push(self.warn(PersistenceTarget::History, &e));
        }
        if let Err(e) = self.fold_stats(&result) {
            warnings.push(self.warn(PersistenceTarget::Stats, &e));
        }

        let mut leaderboard_entry = false;
        if Leaderboard::qualifies(&result) {
            match self.fold_leaderboard(&result) {
                Ok(placed) => leaderboard_entry = placed,
                Err(e) => warnings.push(self.warn(PersistenceTarget::Leaderboard, &e)),
            }
        }

        log::debug!(
            "recorded result {} for {:?} ({}%, {} warning(s))",
            result.id,
            result.title,
            result.score,
            warnings.len()
        );
        RecordOutcome {
            result,
            warnings,
            leaderboard_entry,
        }
    }

    fn warn(&self, target: PersistenceTarget, error: &PersistenceError) -> PersistenceWarning {
        let warning = PersistenceWarning::new(target, error);
        log::warn!("{warning}");
        warning
    }

    /// Append the raw result to history. Existing entries are written back
    /// untouched, whatever shape they are in.
    fn append_history(&self, result: &mut QuizResult) -> Result<(), PersistenceError> {
        let raw = self.store.get(HISTORY_KEY)?;
        let mut entries = coerce::raw_list(coerce::parse(raw.as_deref()));

        if let Some(max) = coerce::max_history_id(&entries) {
            if result.id <= max {
                result.id = max.successor();
            }
        }

        entries.push(serde_json::to_value(&*result)?);
        let encoded = serde_json::to_string(&Value::Array(entries))?;
        self.store.set(HISTORY_KEY, &encoded)?;
        Ok(())
    }

    /// Fold the result into the stored statistics. Fields outside the
    /// aggregate schema are written back as they were.
    fn fold_stats(&self, result: &QuizResult) -> Result<(), PersistenceError> {
        let raw = self.store.get(STATS_KEY)?;
        let mut stored = match coerce::parse(raw.as_deref()) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut stats = coerce::stats(Some(Value::Object(stored.clone())));
        stats.fold(result);
        if let Value::Object(folded) = serde_json::to_value(&stats)? {
            stored.extend(folded);
        }
        self.store.set(STATS_KEY, &serde_json::to_string(&stored)?)?;
        Ok(())
    }

    fn fold_leaderboard(&self, result: &QuizResult) -> Result<bool, PersistenceError> {
        let raw = self.store.get(LEADERBOARD_KEY)?;
        let mut board = coerce::leaderboard(coerce::parse(raw.as_deref()));
        let placed = board.record(result, &self.player_name);
        if placed {
            let encoded = serde_json::to_string(board.entries())?;
            self.store.set(LEADERBOARD_KEY, &encoded)?;
        }
        Ok(placed)
    }

    //
    // ─── READ PATH ────────────────────────────────────────────────────────────
    //

    /// Stored results, oldest first. Malformed entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn list_history(&self) -> Result<Vec<QuizResult>, StorageError> {
        let raw = self.store.get(HISTORY_KEY)?;
        Ok(coerce::history(coerce::parse(raw.as_deref())))
    }

    /// Aggregate statistics, with defaults for anything missing or malformed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn get_stats(&self) -> Result<AggregateStats, StorageError> {
        let raw = self.store.get(STATS_KEY)?;
        Ok(coerce::stats(coerce::parse(raw.as_deref())))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn leaderboard(&self) -> Result<Leaderboard, StorageError> {
        let raw = self.store.get(LEADERBOARD_KEY)?;
        Ok(coerce::leaderboard(coerce::parse(raw.as_deref())))
    }

    /// Every achievement with whether it is unlocked.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn achievements(&self) -> Result<Vec<AchievementStatus>, StorageError> {
        let history = self.list_history()?;
        let stats = self.get_stats()?;
        Ok(achievements::evaluate(&history, &stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{ResultId, TopicStats};
    use quiz_core::time::fixed_now;
    use storage::InMemoryStore;

    fn service() -> (Arc<InMemoryStore>, HistoryService) {
        let store = Arc::new(InMemoryStore::new());
        let service = HistoryService::new(store.clone());
        (store, service)
    }

    fn result(title: &str, correct: u32, total: u32, secs: u64) -> QuizResult {
        QuizResult::from_counts(title, correct, total, secs, fixed_now())
    }

    /// Store whose reads of one key fail.
    struct FailingRead {
        inner: InMemoryStore,
        key: &'static str,
    }

    impl KeyValueStore for FailingRead {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if key == self.key {
                return Err(StorageError::Unavailable("disk on fire".into()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn record_appends_and_folds() {
        let (store, service) = service();
        store
            .set(
                STATS_KEY,
                r#"{"totalQuizzes":2,"averageScore":70,"totalTime":100,"topics":[]}"#,
            )
            .unwrap();

        let outcome = service.record_result(result("X", 1, 2, 50));
        assert!(outcome.is_clean());
        assert!(!outcome.leaderboard_entry);

        let stats = service.get_stats().unwrap();
        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.average_score, 63);
        assert_eq!(stats.total_time, 150);
        assert_eq!(
            stats.topics,
            vec![TopicStats {
                name: "X".into(),
                quizzes: 1,
                average_score: 50
            }]
        );
        assert_eq!(service.list_history().unwrap(), vec![outcome.result]);
    }

    #[test]
    fn colliding_ids_are_bumped() {
        let (_, service) = service();
        let first = service.record_result(result("A", 1, 1, 10)).result;
        let second = service.record_result(result("A", 1, 1, 10)).result;
        assert_eq!(second.id, first.id.successor());

        let ids: Vec<ResultId> = service.list_history().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn foreign_history_entries_survive_append() {
        let (store, service) = service();
        store
            .set(HISTORY_KEY, r#"[{"quizId":"12","legacy":true},"junk"]"#)
            .unwrap();

        service.record_result(result("A", 0, 1, 3));

        let raw: Value = serde_json::from_str(&store.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
        let items = raw.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["legacy"], Value::Bool(true));
        assert_eq!(items[1], Value::String("junk".into()));
    }

    #[test]
    fn unknown_stats_fields_survive_fold() {
        let (store, service) = service();
        store
            .set(
                STATS_KEY,
                r#"{"totalQuizzes":1,"averageScore":50,"totalTime":10,"topics":[],"scoresOverTime":[{"x":1}]}"#,
            )
            .unwrap();

        service.record_result(result("A", 1, 1, 5));

        let raw: Value = serde_json::from_str(&store.get(STATS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw["scoresOverTime"], serde_json::json!([{"x": 1}]));
        assert_eq!(raw["totalQuizzes"], 2);
        assert_eq!(raw["averageScore"], 75);
        assert_eq!(raw["totalTime"], 15);
    }

    #[test]
    fn entries_that_are_not_results_unlock_nothing() {
        let (store, service) = service();
        store
            .set(HISTORY_KEY, r#"[{"quizId":"12","legacy":true}]"#)
            .unwrap();

        assert!(service.list_history().unwrap().is_empty());
        assert!(service.achievements().unwrap().iter().all(|a| !a.unlocked));
    }

    #[test]
    fn corrupt_stats_restart_from_defaults() {
        let (store, service) = service();
        store.set(STATS_KEY, "{{{").unwrap();
        store.set(HISTORY_KEY, "not json").unwrap();

        let outcome = service.record_result(result("", 1, 1, 5));
        assert!(outcome.is_clean());

        let stats = service.get_stats().unwrap();
        assert_eq!(stats.total_quizzes, 1);
        assert_eq!(stats.average_score, 100);
        assert_eq!(stats.topics[0].name, "General");
        assert_eq!(service.list_history().unwrap().len(), 1);
    }

    #[test]
    fn history_read_failure_leaves_history_untouched() {
        let inner = InMemoryStore::new();
        inner.set(HISTORY_KEY, "[1,2,3]").unwrap();
        let store = Arc::new(FailingRead {
            inner: inner.clone(),
            key: HISTORY_KEY,
        });
        let service = HistoryService::new(store);

        let outcome = service.record_result(result("A", 1, 2, 5));
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].target, PersistenceTarget::History);
        assert_eq!(inner.get(HISTORY_KEY).unwrap().as_deref(), Some("[1,2,3]"));
        assert!(inner.get(STATS_KEY).unwrap().is_some());
    }

    #[test]
    fn quota_failures_are_warnings_per_step() {
        let store = Arc::new(InMemoryStore::with_quota(16));
        let service = HistoryService::new(store);

        let outcome = service.record_result(result("Big topic", 9, 10, 5));
        let targets: Vec<_> = outcome.warnings.iter().map(|w| w.target).collect();
        assert_eq!(
            targets,
            vec![
                PersistenceTarget::History,
                PersistenceTarget::Stats,
                PersistenceTarget::Leaderboard
            ]
        );
        assert!(outcome.warnings[0].to_string().starts_with("could not save quiz history"));
    }

    #[test]
    fn high_scores_reach_the_leaderboard() {
        let (_, service) = service();
        let service = service.with_player_name("  Ada ");

        let outcome = service.record_result(result("A", 9, 10, 5));
        assert!(outcome.leaderboard_entry);
        let low = service.record_result(result("B", 8, 10, 5));
        assert!(!low.leaderboard_entry);

        let board = service.leaderboard().unwrap();
        assert_eq!(board.entries().len(), 1);
        assert_eq!(board.entries()[0].name, "Ada");
        assert_eq!(board.entries()[0].score, 90);
    }

    #[test]
    fn blank_player_name_is_anonymous() {
        let (_, service) = service();
        assert_eq!(service.with_player_name("   ").player_name(), "Anonymous");
    }

    #[test]
    fn history_dates_round_trip_through_store() {
        let (_, service) = service();
        let mut r = result("A", 1, 1, 5);
        r.date += Duration::milliseconds(250);
        let stored = service.record_result(r).result;
        assert_eq!(service.list_history().unwrap()[0].date, stored.date);
    }
}
