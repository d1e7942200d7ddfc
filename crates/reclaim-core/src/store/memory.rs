//! In-process document store.
//!
//! Backs the CLI's local state file and the test suite. Mutations are
//! serialized per store by a single mutex, which matches the backend's
//! per-document write serialization from this client's point of view.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{DocumentId, JournalCategory, JournalEntry, NewUserRecord, UserRecord};

use super::{now, Lookup, UserPatch, UserStore};

#[derive(Default)]
struct Inner {
    users: Vec<UserRecord>,
    entries: Vec<JournalEntry>,
    channels: HashMap<String, watch::Sender<Lookup<UserRecord>>>,
    /// One-shot failure injected into the next patch_user call.
    fail_next_patch: bool,
    /// While set, create_user fails with a backend error.
    fail_creates: bool,
}

impl Inner {
    fn lookup(&self, identity_token: &str) -> Lookup<UserRecord> {
        match self
            .users
            .iter()
            .find(|u| u.identity_token == identity_token)
        {
            Some(record) => Lookup::Present(record.clone()),
            None => Lookup::Absent,
        }
    }

    /// Re-deliver the current state to any subscriber of this token.
    fn publish(&mut self, identity_token: &str) {
        let state = self.lookup(identity_token);
        if let Some(tx) = self.channels.get(identity_token) {
            // send_replace updates the value even with no receivers alive.
            tx.send_replace(state);
        }
    }
}

/// Serializable snapshot of the store contents (channels excluded).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub users: Vec<UserRecord>,
    pub entries: Vec<JournalEntry>,
}

/// In-memory [`UserStore`] + [`JournalStore`] implementation.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Rebuild a store from a previously taken snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                users: snapshot.users,
                entries: snapshot.entries,
                ..Default::default()
            }),
        }
    }

    /// Snapshot the current contents for persistence.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.lock().unwrap();
        StoreSnapshot {
            users: inner.users.clone(),
            entries: inner.entries.clone(),
        }
    }

    /// Make the next `patch_user` call fail with a backend error,
    /// leaving the document untouched.
    pub fn fail_next_patch(&self) {
        self.inner.lock().unwrap().fail_next_patch = true;
    }

    /// Toggle failure of `create_user` calls with a backend error.
    pub fn fail_creates(&self, fail: bool) {
        self.inner.lock().unwrap().fail_creates = fail;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn lookup_user(&self, identity_token: &str) -> Result<Lookup<UserRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().lookup(identity_token))
    }

    fn subscribe_user(&self, identity_token: &str) -> watch::Receiver<Lookup<UserRecord>> {
        let mut inner = self.inner.lock().unwrap();
        let state = inner.lookup(identity_token);
        let tx = inner
            .channels
            .entry(identity_token.to_string())
            .or_insert_with(|| watch::channel(Lookup::Unknown).0);
        tx.send_replace(state);
        tx.subscribe()
    }

    async fn create_user(&self, new: NewUserRecord) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_creates {
            return Err(StoreError::Backend("injected create failure".into()));
        }
        if inner
            .users
            .iter()
            .any(|u| u.identity_token == new.identity_token)
        {
            return Err(StoreError::Conflict);
        }
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            identity_token: new.identity_token.clone(),
            onboarded: false,
            recovery_start_date: None,
            last_relapse_date: None,
            profile: Default::default(),
            created_at: now(),
        };
        inner.users.push(record.clone());
        inner.publish(&new.identity_token);
        Ok(record)
    }

    async fn patch_user(
        &self,
        id: &DocumentId,
        patch: UserPatch,
    ) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_patch {
            inner.fail_next_patch = false;
            return Err(StoreError::Backend("injected patch failure".into()));
        }
        let record = inner
            .users
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        patch.apply(record);
        let (token, updated) = (record.identity_token.clone(), record.clone());
        inner.publish(&token);
        Ok(updated)
    }
}

#[async_trait]
impl super::JournalStore for MemoryStore {
    async fn add_entry(
        &self,
        user_id: &DocumentId,
        category: JournalCategory,
        content: String,
    ) -> Result<JournalEntry, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = JournalEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.clone(),
            content,
            category,
            created_at: now(),
            updated_at: None,
        };
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_entries(&self, user_id: &DocumentId) -> Result<Vec<JournalEntry>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<JournalEntry> = inner
            .entries
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn update_entry(
        &self,
        user_id: &DocumentId,
        entry_id: &DocumentId,
        content: String,
    ) -> Result<JournalEntry, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| &e.id == entry_id)
            .ok_or_else(|| StoreError::NotFound(entry_id.clone()))?;
        if &entry.user_id != user_id {
            return Err(StoreError::Forbidden("entry belongs to another user".into()));
        }
        entry.content = content;
        entry.updated_at = Some(now());
        Ok(entry.clone())
    }

    async fn delete_entry(
        &self,
        user_id: &DocumentId,
        entry_id: &DocumentId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let index = inner
            .entries
            .iter()
            .position(|e| &e.id == entry_id)
            .ok_or_else(|| StoreError::NotFound(entry_id.clone()))?;
        if &inner.entries[index].user_id != user_id {
            return Err(StoreError::Forbidden("entry belongs to another user".into()));
        }
        inner.entries.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JournalStore;

    #[tokio::test]
    async fn duplicate_create_is_a_conflict() {
        let store = MemoryStore::new();
        store.create_user(NewUserRecord::new("u1")).await.unwrap();
        let err = store
            .create_user(NewUserRecord::new("u1"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn subscribe_starts_at_current_state_and_redelivers() {
        let store = MemoryStore::new();
        let rx = store.subscribe_user("u1");
        assert_eq!(*rx.borrow(), Lookup::Absent);

        store.create_user(NewUserRecord::new("u1")).await.unwrap();
        assert!(rx.borrow().is_present());
    }

    #[tokio::test]
    async fn failed_patch_leaves_record_untouched() {
        let store = MemoryStore::new();
        let record = store.create_user(NewUserRecord::new("u1")).await.unwrap();

        store.fail_next_patch();
        let at = now();
        let err = store
            .patch_user(&record.id, UserPatch::relapse(at))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        let lookup = store.lookup_user("u1").await.unwrap();
        assert_eq!(lookup.record().unwrap().last_relapse_date, None);
    }

    #[tokio::test]
    async fn journal_mutation_is_owner_only() {
        let store = MemoryStore::new();
        let owner = store.create_user(NewUserRecord::new("u1")).await.unwrap();
        let other = store.create_user(NewUserRecord::new("u2")).await.unwrap();

        let entry = store
            .add_entry(&owner.id, JournalCategory::Gratitude, "grateful".into())
            .await
            .unwrap();

        let err = store
            .update_entry(&other.id, &entry.id, "rewritten".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));

        let err = store.delete_entry(&other.id, &entry.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));

        store.delete_entry(&owner.id, &entry.id).await.unwrap();
        assert!(store.list_entries(&owner.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_roundtrip_preserves_documents() {
        let store = MemoryStore::new();
        let user = store.create_user(NewUserRecord::new("u1")).await.unwrap();
        store
            .add_entry(&user.id, JournalCategory::Progress, "day one".into())
            .await
            .unwrap();

        let revived = MemoryStore::from_snapshot(store.snapshot());
        assert!(revived.lookup_user("u1").await.unwrap().is_present());
        assert_eq!(revived.list_entries(&user.id).await.unwrap().len(), 1);
    }
}
