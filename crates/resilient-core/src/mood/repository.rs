//! Persistence boundary for the mood log: long-term Sled storage or an in-memory map.

use super::MoodEntry;
use crate::error::MoodStoreError;
use dashmap::DashMap;
use sled::{Db, Tree};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

const MOOD_TREE: &str = "mood_entries";

/// Generic save/fetch collaborator. Implementations must return entries in save order.
pub trait MoodRepository: Send + Sync {
    fn save(&self, entry: &MoodEntry) -> Result<(), MoodStoreError>;

    fn fetch(&self, predicate: &dyn Fn(&MoodEntry) -> bool) -> Result<Vec<MoodEntry>, MoodStoreError>;
}

/// Sled-backed repository. Keys are big-endian sequence numbers so iteration is insertion order.
pub struct SledMoodRepository {
    db: Db,
    tree: Tree,
}

impl SledMoodRepository {
    /// Opens or creates the database under `path`.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, MoodStoreError> {
        let db = sled::open(path)?;
        let tree = db.open_tree(MOOD_TREE)?;
        Ok(Self { db, tree })
    }
}

impl MoodRepository for SledMoodRepository {
    fn save(&self, entry: &MoodEntry) -> Result<(), MoodStoreError> {
        let seq = self.db.generate_id()?;
        let value = serde_json::to_vec(entry)?;
        self.tree.insert(seq.to_be_bytes(), value)?;
        self.tree.flush()?;
        Ok(())
    }

    fn fetch(&self, predicate: &dyn Fn(&MoodEntry) -> bool) -> Result<Vec<MoodEntry>, MoodStoreError> {
        let mut out = Vec::new();
        for item in self.tree.iter() {
            let (_key, value) = item?;
            let entry: MoodEntry = serde_json::from_slice(&value)?;
            if predicate(&entry) {
                out.push(entry);
            }
        }
        Ok(out)
    }
}

/// Volatile repository, mainly for tests and previews.
#[derive(Default)]
pub struct MemoryRepository {
    entries: DashMap<u64, MoodEntry>,
    next_seq: AtomicU64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MoodRepository for MemoryRepository {
    fn save(&self, entry: &MoodEntry) -> Result<(), MoodStoreError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(seq, entry.clone());
        Ok(())
    }

    fn fetch(&self, predicate: &dyn Fn(&MoodEntry) -> bool) -> Result<Vec<MoodEntry>, MoodStoreError> {
        let mut matched: Vec<(u64, MoodEntry)> = self
            .entries
            .iter()
            .filter(|kv| predicate(kv.value()))
            .map(|kv| (*kv.key(), kv.value().clone()))
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        Ok(matched.into_iter().map(|(_, e)| e).collect())
    }
}
