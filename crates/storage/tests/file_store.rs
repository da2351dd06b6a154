use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use storage::{FileStore, KeyValueStore, Storage, StorageError};

fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("quiz-store-{name}-{}-{nanos}", std::process::id()))
}

#[test]
fn file_store_round_trips_and_survives_reopen() {
    let dir = scratch_dir("roundtrip");
    let store = FileStore::open(&dir).expect("open");

    assert_eq!(store.get("quizHistory").unwrap(), None);
    store.set("quizHistory", r#"[{"id":1}]"#).unwrap();
    store.set("quizHistory", r#"[{"id":1},{"id":2}]"#).unwrap();

    let reopened = FileStore::open(&dir).expect("reopen");
    assert_eq!(
        reopened.get("quizHistory").unwrap().as_deref(),
        Some(r#"[{"id":1},{"id":2}]"#)
    );
    assert!(dir.join("quizHistory.json").exists());
    assert!(!dir.join("quizHistory.json.tmp").exists());

    reopened.remove("quizHistory").unwrap();
    reopened.remove("quizHistory").unwrap();
    assert_eq!(reopened.get("quizHistory").unwrap(), None);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = scratch_dir("keys");
    let store = FileStore::open(&dir).expect("open");

    let err = store.set("../escape", "x").unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey(_)));
    assert!(matches!(store.get("").unwrap_err(), StorageError::InvalidKey(_)));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn storage_handle_wraps_file_backend() {
    let dir = scratch_dir("handle");
    let storage = Storage::file(&dir).expect("storage");
    storage.kv.set("quizStats", "{}").unwrap();
    assert_eq!(storage.kv.get("quizStats").unwrap().as_deref(), Some("{}"));

    std::fs::remove_dir_all(&dir).ok();
}
