// tests/history_store.rs
use chrono::{Duration, TimeZone, Utc};
use keyword_newsbot::{JsonFileHistory, SentHistory};
use std::fs;

#[test]
fn missing_file_is_created_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("sent_articles.json");

    let h = JsonFileHistory::open(&path).unwrap();

    assert!(h.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
}

#[test]
fn corrupt_file_starts_empty_and_accepts_new_marks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent_articles.json");
    fs::write(&path, "{ this is not json").unwrap();

    let mut h = JsonFileHistory::open(&path).expect("corrupt store must not fail");
    assert!(!h.exists("https://n/1"));
    assert!(h.is_empty());

    h.mark_sent("https://n/1").unwrap();
    let reopened = JsonFileHistory::open(&path).unwrap();
    assert!(reopened.exists("https://n/1"));
}

#[test]
fn marks_survive_reopen_and_stay_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent_articles.json");
    let at = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();

    let mut h = JsonFileHistory::open(&path).unwrap();
    h.mark_sent_at("https://n/한국", at).unwrap();
    drop(h);

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"https://n/한국\": \"2025-09-06T09:00:00Z\""));
    assert!(!path.with_file_name("sent_articles.json.tmp").exists());

    let h = JsonFileHistory::open(&path).unwrap();
    assert_eq!(h.sent_at("https://n/한국"), Some(at));
}

#[test]
fn legacy_naive_timestamps_are_understood() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent_articles.json");
    fs::write(
        &path,
        r#"{"https://n/1": "2025-09-05T08:00:00.123456", "https://n/2": "2025-08-01T08:00:00"}"#,
    )
    .unwrap();

    let mut h = JsonFileHistory::open(&path).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();

    assert_eq!(h.purge_older_than_at(7.0, now).unwrap(), 1);
    assert!(h.exists("https://n/1"));
    assert!(!h.exists("https://n/2"));
}

#[test]
fn purge_persists_the_reduced_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent_articles.json");
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();

    let mut h = JsonFileHistory::open(&path).unwrap();
    h.mark_sent_at("old", now - Duration::days(3 + 1)).unwrap();
    h.mark_sent_at("fresh", now - Duration::days(1)).unwrap();

    assert_eq!(h.purge_older_than_at(3.0, now).unwrap(), 1);

    let reopened = JsonFileHistory::open(&path).unwrap();
    assert!(!reopened.exists("old"));
    assert!(reopened.exists("fresh"));
    assert_eq!(reopened.len(), 1);
}

#[test]
fn reload_picks_up_external_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent_articles.json");
    let mut h = JsonFileHistory::open(&path).unwrap();

    fs::write(&path, r#"{"https://n/x": "2025-09-06T09:00:00Z"}"#).unwrap();
    h.load().unwrap();

    assert!(h.exists("https://n/x"));
}

#[test]
fn failed_save_leaves_memory_matching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sent.json");
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();

    let mut h = JsonFileHistory::open(&path).unwrap();
    h.mark_sent_at("old", now - Duration::days(30)).unwrap();
    // A directory where the temp file should go makes every save fail.
    fs::create_dir(dir.path().join("sent.json.tmp")).unwrap();

    assert!(h.mark_sent_at("new", now).is_err());
    assert!(!h.exists("new"));

    assert!(h.purge_older_than_at(7.0, now).is_err());
    assert!(h.exists("old"));

    let reopened = JsonFileHistory::open(&path).unwrap();
    assert!(reopened.exists("old"));
    assert!(!reopened.exists("new"));
}
