//! Integration test: mood log ordering, validation and sled persistence.
//!
//! ## Scenario
//! 1. Log entries in a sled-backed store and reopen it from the same path.
//! 2. **Confirm** the restored log has the same entries in the same order.
//! 3. **Confirm** rejected entries never reach the repository.

use chrono::{Duration, Utc};
use resilient_core::{
    MemoryRepository, MoodEntry, MoodRepository, MoodStore, MoodStoreError, SledMoodRepository,
    ValidationError,
};
use std::sync::Arc;

#[test]
fn all_entries_preserves_call_order() {
    let store = MoodStore::new();
    let base = Utc::now() - Duration::hours(4);
    for (i, mood) in ["calm", "tense", "sad", "hopeful"].iter().enumerate() {
        store
            .add_entry(MoodEntry::new(*mood, 3).at(base + Duration::minutes(i as i64 * 10)))
            .unwrap();
    }
    let moods: Vec<String> = store.all_entries().iter().map(|e| e.mood.clone()).collect();
    assert_eq!(moods, vec!["calm", "tense", "sad", "hopeful"]);
}

#[test]
fn equal_timestamps_are_accepted() {
    let store = MoodStore::new();
    let now = Utc::now();
    store.add_entry(MoodEntry::new("a", 2).at(now)).unwrap();
    store.add_entry(MoodEntry::new("b", 2).at(now)).unwrap();
    assert_eq!(store.len(), 2);
}

#[test]
fn invalid_intensity_leaves_log_and_repository_untouched() {
    let repo = Arc::new(MemoryRepository::new());
    let store = MoodStore::with_repository(repo.clone()).unwrap();
    store.add_entry(MoodEntry::new("calm", 1)).unwrap();

    for bad in [0u8, 6] {
        let err = store.add_entry(MoodEntry::new("sad", bad)).unwrap_err();
        assert!(matches!(
            err,
            MoodStoreError::Validation(ValidationError::IntensityOutOfRange(_))
        ));
    }
    assert_eq!(store.len(), 1);
    assert_eq!(repo.fetch(&|_| true).unwrap().len(), 1);
}

#[test]
fn sled_log_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mood_log");
    let base = Utc::now() - Duration::days(2);

    {
        let repo = Arc::new(SledMoodRepository::open_path(&path).unwrap());
        let store = MoodStore::with_repository(repo).unwrap();
        store
            .add_entry(
                MoodEntry::new("hurt", 4)
                    .at(base)
                    .with_rejection(Some("job interview"))
                    .with_note("They went with someone else."),
            )
            .unwrap();
        store
            .add_entry(
                MoodEntry::new("calmer", 2)
                    .at(base + Duration::hours(6))
                    .with_strategy("box-breathing"),
            )
            .unwrap();
    }

    let repo = Arc::new(SledMoodRepository::open_path(&path).unwrap());
    let store = MoodStore::with_repository(repo).unwrap();
    let entries = store.all_entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].mood, "hurt");
    assert_eq!(entries[0].rejection_trigger.as_deref(), Some("job interview"));
    assert_eq!(entries[1].coping_strategy_used.as_deref(), Some("box-breathing"));

    // Ordering is enforced against restored entries too.
    let err = store
        .add_entry(MoodEntry::new("late", 3).at(base - Duration::hours(1)))
        .unwrap_err();
    assert!(matches!(
        err,
        MoodStoreError::Validation(ValidationError::OutOfOrder { .. })
    ));
}
