use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::journal::models::{EntryPatch, JournalEntry, NewEntry};
use crate::journal::repository::{new_journal_entry, EntryRepository};

/// Process-local entry store, used when no database is configured.
#[derive(Default)]
pub struct InMemoryEntryRepository {
    entries: RwLock<HashMap<Uuid, JournalEntry>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully-formed entry as-is. Used to seed fixtures.
    pub async fn insert(&self, entry: JournalEntry) {
        self.entries.write().await.insert(entry.id, entry);
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<JournalEntry>> {
        let entries = self.entries.read().await;
        let mut owned: Vec<JournalEntry> = entries
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        // HashMap order is arbitrary; give callers a stable snapshot.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<JournalEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&id).filter(|e| e.owner_id == owner_id).cloned())
    }

    async fn create(&self, entry: NewEntry) -> Result<JournalEntry> {
        let entry = new_journal_entry(entry, Utc::now());
        self.entries.write().await.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: EntryPatch,
    ) -> Result<Option<JournalEntry>> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&id).filter(|e| e.owner_id == owner_id) {
            Some(entry) => {
                patch.apply(entry, Utc::now());
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
        let mut entries = self.entries.write().await;
        if entries.get(&id).is_some_and(|e| e.owner_id == owner_id) {
            entries.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
