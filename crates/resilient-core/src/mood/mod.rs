//! Mood log: the append-only source of truth for everything downstream.
//!
//! Writers go through a single `RwLock`; readers get an `Arc` snapshot so a slow
//! consumer (recommendation refresh, AI serialization) never blocks the next append.

mod repository;

pub use repository::{MemoryRepository, MoodRepository, SledMoodRepository};

use crate::error::{MoodStoreError, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::{Arc, RwLock};

pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 5;

/// One mood submission. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub mood: String,
    /// 1 (mild) to 5 (overwhelming).
    pub intensity: u8,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub is_rejection_related: bool,
    #[serde(default)]
    pub rejection_trigger: Option<String>,
    /// Strategy id from the catalog, if the user tried one.
    #[serde(default)]
    pub coping_strategy_used: Option<String>,
}

impl MoodEntry {
    /// New entry stamped with a fresh id and the current time.
    pub fn new(mood: impl Into<String>, intensity: u8) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: Utc::now(),
            mood: mood.into(),
            intensity,
            note: None,
            is_rejection_related: false,
            rejection_trigger: None,
            coping_strategy_used: None,
        }
    }

    pub fn at(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Marks the entry rejection related; an empty trigger is stored as `None`.
    pub fn with_rejection(mut self, trigger: Option<&str>) -> Self {
        self.is_rejection_related = true;
        self.rejection_trigger = trigger
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn with_strategy(mut self, strategy_id: impl Into<String>) -> Self {
        self.coping_strategy_used = Some(strategy_id.into());
        self
    }

    /// Checks the entry on its own (no ordering against the log).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_INTENSITY..=MAX_INTENSITY).contains(&self.intensity) {
            return Err(ValidationError::IntensityOutOfRange(self.intensity));
        }
        if !self.is_rejection_related && self.rejection_trigger.is_some() {
            return Err(ValidationError::TriggerWithoutRejection);
        }
        Ok(())
    }
}

/// Read-only snapshot of the log, in insertion order. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct MoodLog(Arc<Vec<MoodEntry>>);

impl MoodLog {
    pub fn to_vec(&self) -> Vec<MoodEntry> {
        self.0.as_ref().clone()
    }
}

impl Deref for MoodLog {
    type Target = [MoodEntry];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

/// Append-only, ordered mood log with an optional persistence collaborator.
pub struct MoodStore {
    entries: RwLock<Arc<Vec<MoodEntry>>>,
    repository: Option<Arc<dyn MoodRepository>>,
}

impl MoodStore {
    /// Purely in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
            repository: None,
        }
    }

    /// Store backed by `repository`; previously saved entries are replayed in insertion order.
    pub fn with_repository(repository: Arc<dyn MoodRepository>) -> Result<Self, MoodStoreError> {
        let existing = repository.fetch(&|_| true)?;
        tracing::debug!(
            target: "resilient::mood",
            restored = existing.len(),
            "mood log restored from repository"
        );
        Ok(Self {
            entries: RwLock::new(Arc::new(existing)),
            repository: Some(repository),
        })
    }

    /// Appends `entry`. On any error the log (and the repository) is left untouched.
    pub fn add_entry(&self, entry: MoodEntry) -> Result<(), MoodStoreError> {
        entry.validate()?;

        let mut guard = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(latest) = guard.last() {
            if entry.date < latest.date {
                return Err(ValidationError::OutOfOrder {
                    latest: latest.date.to_rfc3339(),
                    given: entry.date.to_rfc3339(),
                }
                .into());
            }
        }

        if let Some(repo) = &self.repository {
            repo.save(&entry)?;
        }

        tracing::info!(
            target: "resilient::mood",
            entry_id = %entry.id,
            intensity = entry.intensity,
            rejection_related = entry.is_rejection_related,
            "mood entry logged"
        );
        Arc::make_mut(&mut guard).push(entry);
        Ok(())
    }

    /// Snapshot of every entry in insertion order.
    pub fn all_entries(&self) -> MoodLog {
        let guard = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        MoodLog(Arc::clone(&guard))
    }

    /// Entries with `date >= cutoff`, in insertion order.
    pub fn entries_since(&self, cutoff: DateTime<Utc>) -> Vec<MoodEntry> {
        self.all_entries()
            .iter()
            .filter(|e| e.date >= cutoff)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<MoodEntry> {
        self.all_entries().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.all_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MoodStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rejects_out_of_range_intensity() {
        let store = MoodStore::new();
        for bad in [0u8, 6, 42, u8::MAX] {
            let err = store.add_entry(MoodEntry::new("sad", bad)).unwrap_err();
            assert!(matches!(
                err,
                MoodStoreError::Validation(ValidationError::IntensityOutOfRange(i)) if i == bad
            ));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn free_text_mood_is_not_validated() {
        let store = MoodStore::new();
        store.add_entry(MoodEntry::new("", 3)).unwrap();
        store.add_entry(MoodEntry::new("   ", 1)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn trigger_requires_rejection_flag() {
        let mut entry = MoodEntry::new("hurt", 3);
        entry.rejection_trigger = Some("ghosted".to_string());
        assert_eq!(entry.validate(), Err(ValidationError::TriggerWithoutRejection));
    }

    #[test]
    fn blank_trigger_is_dropped() {
        let entry = MoodEntry::new("hurt", 3).with_rejection(Some("   "));
        assert!(entry.is_rejection_related);
        assert!(entry.rejection_trigger.is_none());
    }

    #[test]
    fn out_of_order_dates_are_rejected() {
        let store = MoodStore::new();
        let now = Utc::now();
        store.add_entry(MoodEntry::new("calm", 2).at(now)).unwrap();
        let err = store
            .add_entry(MoodEntry::new("tense", 3).at(now - Duration::minutes(5)))
            .unwrap_err();
        assert!(matches!(
            err,
            MoodStoreError::Validation(ValidationError::OutOfOrder { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_appends() {
        let store = MoodStore::new();
        store.add_entry(MoodEntry::new("calm", 2)).unwrap();
        let snapshot = store.all_entries();
        store.add_entry(MoodEntry::new("tense", 3)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.all_entries().len(), 2);
    }

    #[test]
    fn entries_since_is_inclusive() {
        let store = MoodStore::new();
        let base = Utc::now() - Duration::days(3);
        store.add_entry(MoodEntry::new("a", 1).at(base)).unwrap();
        store
            .add_entry(MoodEntry::new("b", 2).at(base + Duration::days(1)))
            .unwrap();
        store
            .add_entry(MoodEntry::new("c", 3).at(base + Duration::days(2)))
            .unwrap();

        let since = store.entries_since(base + Duration::days(1));
        let moods: Vec<&str> = since.iter().map(|e| e.mood.as_str()).collect();
        assert_eq!(moods, vec!["b", "c"]);
    }
}
