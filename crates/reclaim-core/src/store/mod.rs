//! Document store boundary.
//!
//! The backend is an external hosted document store; this module defines the
//! narrow surface the core depends on, plus two implementations:
//!
//! - [`MemoryStore`]: in-process store used by tests and the CLI state layer
//! - [`RemoteStore`]: reqwest JSON client for a hosted document API
//!
//! Reads are reactive: `subscribe_user` hands out a watch channel that
//! re-delivers a [`Lookup`] on every change to the matching document.

mod memory;
mod http;

pub use http::RemoteStore;
pub use memory::{MemoryStore, StoreSnapshot};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::StoreError;
use crate::model::{DocumentId, JournalCategory, JournalEntry, NewUserRecord, Profile, UserRecord};

/// Three-valued result of a reactive read.
///
/// An explicit tagged variant rather than nested `Option`s, so "still
/// resolving" and "confirmed absent" stay unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lookup<T> {
    /// The query has not resolved yet.
    Unknown,
    /// The query resolved: no matching document exists.
    Absent,
    /// The query resolved to a fully-formed document.
    Present(T),
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Lookup::Unknown
    }
}

impl<T> Lookup<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present(_))
    }

    /// The document, if resolved and present.
    pub fn record(&self) -> Option<&T> {
        match self {
            Lookup::Present(value) => Some(value),
            _ => None,
        }
    }
}

/// Sparse patch against a [`UserRecord`]. Only set fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_relapse_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl UserPatch {
    /// Patch that overwrites the relapse anchor.
    pub fn relapse(at: DateTime<Utc>) -> Self {
        Self {
            last_relapse_date: Some(at),
            ..Default::default()
        }
    }

    /// Patch that marks the beginning of recovery.
    pub fn recovery_start(at: DateTime<Utc>) -> Self {
        Self {
            recovery_start_date: Some(at),
            ..Default::default()
        }
    }

    /// Apply this patch to a record in place.
    pub fn apply(&self, record: &mut UserRecord) {
        if let Some(onboarded) = self.onboarded {
            record.onboarded = onboarded;
        }
        if let Some(start) = self.recovery_start_date {
            record.recovery_start_date = Some(start);
        }
        if let Some(relapse) = self.last_relapse_date {
            record.last_relapse_date = Some(relapse);
        }
        if let Some(profile) = &self.profile {
            record.profile = profile.clone();
        }
    }
}

/// User-document operations the core depends on.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// One-shot read keyed by identity token.
    async fn lookup_user(&self, identity_token: &str) -> Result<Lookup<UserRecord>, StoreError>;

    /// Reactive read keyed by identity token. The receiver starts at the
    /// current state and re-delivers on every change.
    fn subscribe_user(&self, identity_token: &str) -> watch::Receiver<Lookup<UserRecord>>;

    /// Create a user document. Fails with [`StoreError::Conflict`] when a
    /// document with the same identity token already exists.
    async fn create_user(&self, new: NewUserRecord) -> Result<UserRecord, StoreError>;

    /// Apply a sparse patch, returning the updated document.
    async fn patch_user(&self, id: &DocumentId, patch: UserPatch)
        -> Result<UserRecord, StoreError>;
}

/// Journal-document operations the core depends on.
#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn add_entry(
        &self,
        user_id: &DocumentId,
        category: JournalCategory,
        content: String,
    ) -> Result<JournalEntry, StoreError>;

    /// Entries for one user, newest first.
    async fn list_entries(&self, user_id: &DocumentId) -> Result<Vec<JournalEntry>, StoreError>;

    /// Replace an entry's content, stamping `updated_at`. Owner only.
    async fn update_entry(
        &self,
        user_id: &DocumentId,
        entry_id: &DocumentId,
        content: String,
    ) -> Result<JournalEntry, StoreError>;

    /// Remove an entry. Owner only.
    async fn delete_entry(
        &self,
        user_id: &DocumentId,
        entry_id: &DocumentId,
    ) -> Result<(), StoreError>;
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
