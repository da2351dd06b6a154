//! Field-by-field coercion of loosely typed stored or fetched JSON.
//!
//! Nothing here fails: wrong-typed or missing fields fall back to the schema
//! default for that field only.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use quiz_core::model::{
    AggregateStats, Leaderboard, LeaderboardEntry, QuizResult, ResultId, TopicStats,
};

/// Keys an identifier may arrive under, in precedence order.
pub(crate) const ID_KEYS: [&str; 3] = ["id", "quizId", "_id"];

/// Parse stored text as JSON; absent or unparsable text yields `None`.
pub(crate) fn parse(raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("discarding unparsable stored value: {e}");
            None
        }
    }
}

/// Non-negative integer from a JSON number; floats are rounded.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn as_count(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 {
        Some(f.round() as u64)
    } else {
        None
    }
}

fn as_percent(value: Option<&Value>) -> Option<u32> {
    as_count(value).map(|n| u32::try_from(n.min(100)).unwrap_or(100))
}

fn as_u32(value: Option<&Value>) -> Option<u32> {
    as_count(value).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn as_string(value: Option<&Value>) -> Option<String> {
    value?.as_str().map(str::to_owned)
}

/// Id from a number or a numeric string.
fn id_value(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => as_count(Some(other)),
    }
}

/// The first present (non-null) id variant decides; later variants are not consulted.
pub(crate) fn canonical_id(obj: &Map<String, Value>) -> Option<u64> {
    ID_KEYS
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
        .and_then(id_value)
}

pub(crate) fn parse_datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Timestamps without an offset are taken as UTC.
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

//
// ─── HISTORY ──────────────────────────────────────────────────────────────────
//

/// Stored history as raw entries; anything but an array counts as empty.
pub(crate) fn raw_list(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        Some(_) => {
            log::warn!("stored list is not an array; starting from empty");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Smallest id read as a millisecond timestamp when an entry has no date
/// (2001-09-09T01:46:40Z).
const MIN_TIMESTAMP_ID: u64 = 1_000_000_000_000;

fn date_from_id(id: u64) -> Option<DateTime<Utc>> {
    if id < MIN_TIMESTAMP_ID {
        return None;
    }
    i64::try_from(id).ok().and_then(DateTime::from_timestamp_millis)
}

/// One stored result. Entries without at least one question are not results
/// and yield `None`.
pub(crate) fn history_entry(value: &Value) -> Option<QuizResult> {
    let obj = value.as_object()?;
    let total_questions = as_u32(obj.get("totalQuestions")).filter(|n| *n >= 1)?;
    let id = canonical_id(obj).unwrap_or(0);
    let correct_answers = as_u32(obj.get("correctAnswers"))
        .unwrap_or(0)
        .min(total_questions);
    let date = parse_datetime(obj.get("date"))
        .or_else(|| date_from_id(id))
        .unwrap_or(DateTime::UNIX_EPOCH);

    Some(QuizResult {
        id: ResultId::new(id),
        title: as_string(obj.get("title")).unwrap_or_default(),
        score: as_percent(obj.get("score"))
            .and_then(|p| u8::try_from(p).ok())
            .unwrap_or(0),
        total_questions,
        correct_answers,
        time_taken: as_count(obj.get("timeTaken")).unwrap_or(0),
        date,
    })
}

pub(crate) fn history(value: Option<Value>) -> Vec<QuizResult> {
    raw_list(value).iter().filter_map(history_entry).collect()
}

/// Largest id among raw history entries, whichever variant it is stored under.
pub(crate) fn max_history_id(entries: &[Value]) -> Option<ResultId> {
    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(canonical_id)
        .max()
        .map(ResultId::new)
}

//
// ─── STATS ────────────────────────────────────────────────────────────────────
//

fn topic_entry(value: &Value) -> Option<TopicStats> {
    let obj = value.as_object()?;
    let name = as_string(obj.get("name")).filter(|n| !n.is_empty())?;
    Some(TopicStats {
        name,
        quizzes: as_count(obj.get("quizzes")).unwrap_or(0),
        average_score: as_percent(obj.get("averageScore")).unwrap_or(0),
    })
}

pub(crate) fn stats(value: Option<Value>) -> AggregateStats {
    let Some(Value::Object(obj)) = value else {
        return AggregateStats::default();
    };
    let topics = match obj.get("topics") {
        Some(Value::Array(items)) => items.iter().filter_map(topic_entry).collect(),
        _ => Vec::new(),
    };
    AggregateStats {
        total_quizzes: as_count(obj.get("totalQuizzes")).unwrap_or(0),
        average_score: as_percent(obj.get("averageScore")).unwrap_or(0),
        total_time: as_count(obj.get("totalTime")).unwrap_or(0),
        topics,
    }
}

//
// ─── LEADERBOARD ──────────────────────────────────────────────────────────────
//

fn leaderboard_entry(value: &Value) -> Option<LeaderboardEntry> {
    let obj = value.as_object()?;
    Some(LeaderboardEntry {
        id: ResultId::new(canonical_id(obj).unwrap_or(0)),
        name: as_string(obj.get("name")).unwrap_or_default(),
        score: as_percent(obj.get("score"))
            .and_then(|p| u8::try_from(p).ok())
            .unwrap_or(0),
        quizzes: as_u32(obj.get("quizzes")).unwrap_or(1),
    })
}

pub(crate) fn leaderboard(value: Option<Value>) -> Leaderboard {
    let entries = raw_list(value).iter().filter_map(leaderboard_entry).collect();
    Leaderboard::from_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unparsable_or_missing_stats_are_defaults() {
        assert_eq!(stats(parse(Some("{not json"))), AggregateStats::default());
        assert_eq!(stats(parse(None)), AggregateStats::default());
        assert_eq!(stats(Some(json!([1, 2]))), AggregateStats::default());
    }

    #[test]
    fn stats_fields_coerce_independently() {
        let value = json!({
            "totalQuizzes": "three",
            "averageScore": 72.6,
            "totalTime": 120,
            "topics": [
                {"name": "Rust", "quizzes": 2, "averageScore": 150},
                {"name": 42, "quizzes": 1},
                "junk",
                {"name": "Go", "quizzes": -1, "averageScore": null}
            ],
            "scoresOverTime": []
        });
        let coerced = stats(Some(value));
        assert_eq!(coerced.total_quizzes, 0);
        assert_eq!(coerced.average_score, 73);
        assert_eq!(coerced.total_time, 120);
        assert_eq!(
            coerced.topics,
            vec![
                TopicStats {
                    name: "Rust".into(),
                    quizzes: 2,
                    average_score: 100
                },
                TopicStats {
                    name: "Go".into(),
                    quizzes: 0,
                    average_score: 0
                },
            ]
        );
    }

    #[test]
    fn first_present_id_variant_wins() {
        let obj = json!({"quizId": "17", "_id": 99});
        assert_eq!(canonical_id(obj.as_object().unwrap()), Some(17));

        let obj = json!({"id": null, "_id": 5});
        assert_eq!(canonical_id(obj.as_object().unwrap()), Some(5));

        let obj = json!({"id": "abc", "quizId": 3});
        assert_eq!(canonical_id(obj.as_object().unwrap()), None);
    }

    #[test]
    fn history_entries_normalize_ids_and_dates() {
        let value = json!([
            {"_id": 1_700_000_000_000_u64, "title": "A", "score": 50, "totalQuestions": 2, "correctAnswers": 1, "timeTaken": 30},
            {"id": 2, "title": "B", "score": 100, "totalQuestions": 1, "correctAnswers": 5, "date": "2024-01-02T03:04:05.000Z"},
            7
        ]);
        let results = history(Some(value));
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].id, ResultId::new(1_700_000_000_000));
        assert_eq!(results[0].date.timestamp(), 1_700_000_000);
        assert_eq!(results[1].correct_answers, 1);
        assert_eq!(results[1].date.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn entries_without_questions_are_skipped() {
        let value = json!([
            {"quizId": "12", "legacy": true},
            {"id": 3, "totalQuestions": 0, "timeTaken": 4},
            {"id": 4, "title": "C", "score": 100, "totalQuestions": 1, "correctAnswers": 1}
        ]);
        let results = history(Some(value));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ResultId::new(4));
        // Small ids are not timestamps.
        assert_eq!(results[0].date, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let dt = parse_datetime(Some(&json!("2024-05-06T07:08:09.123456"))).unwrap();
        assert_eq!(dt.timestamp(), 1_714_979_289);
    }

    #[test]
    fn max_id_spans_variants() {
        let entries = vec![json!({"id": 4}), json!({"quizId": 9}), json!("x")];
        assert_eq!(max_history_id(&entries), Some(ResultId::new(9)));
    }

    #[test]
    fn leaderboard_is_resorted_on_read() {
        let board = leaderboard(Some(json!([
            {"id": 1, "name": "a", "score": 86, "quizzes": 1},
            {"id": 2, "name": "b", "score": 99, "quizzes": 1}
        ])));
        assert_eq!(board.entries()[0].name, "b");
    }
}
