//! Journaling operations over the document store.
//!
//! Entries belong to exactly one user and are mutated only by their
//! owner; the owner check lives in the store, this layer adds input
//! validation and analytics.

use std::sync::Arc;

use chrono::Utc;

use crate::analytics::{track_event, Analytics};
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::model::{DocumentId, JournalCategory, JournalEntry};
use crate::store::JournalStore;

pub struct JournalService<S: JournalStore> {
    store: Arc<S>,
    analytics: Option<Arc<dyn Analytics>>,
}

impl<S: JournalStore> JournalService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            analytics: None,
        }
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Add an entry. Blank content is rejected before hitting the store.
    pub async fn add(
        &self,
        user_id: &DocumentId,
        category: JournalCategory,
        content: &str,
    ) -> Result<JournalEntry> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CoreError::Validation(ValidationError::Empty(
                "content".into(),
            )));
        }
        let entry = self
            .store
            .add_entry(user_id, category, content.to_string())
            .await?;
        if let Some(analytics) = &self.analytics {
            track_event(
                analytics.as_ref(),
                &Event::JournalEntryAdded {
                    category,
                    at: Utc::now(),
                },
            );
        }
        Ok(entry)
    }

    /// Entries for one user, newest first.
    pub async fn list(&self, user_id: &DocumentId) -> Result<Vec<JournalEntry>> {
        Ok(self.store.list_entries(user_id).await?)
    }

    /// Rewrite an entry's content. Owner only; stamps `updated_at`.
    pub async fn edit(
        &self,
        user_id: &DocumentId,
        entry_id: &DocumentId,
        content: &str,
    ) -> Result<JournalEntry> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CoreError::Validation(ValidationError::Empty(
                "content".into(),
            )));
        }
        Ok(self
            .store
            .update_entry(user_id, entry_id, content.to_string())
            .await?)
    }

    /// Delete an entry. Owner only.
    pub async fn delete(&self, user_id: &DocumentId, entry_id: &DocumentId) -> Result<()> {
        Ok(self.store.delete_entry(user_id, entry_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::RecordingAnalytics;
    use crate::model::NewUserRecord;
    use crate::store::{MemoryStore, UserStore};

    async fn service_with_user() -> (JournalService<MemoryStore>, DocumentId, Arc<RecordingAnalytics>)
    {
        let store = Arc::new(MemoryStore::new());
        let user = store.create_user(NewUserRecord::new("u1")).await.unwrap();
        let analytics = Arc::new(RecordingAnalytics::new());
        let service =
            JournalService::new(store).with_analytics(Arc::clone(&analytics) as Arc<dyn Analytics>);
        (service, user.id, analytics)
    }

    #[tokio::test]
    async fn add_rejects_blank_content() {
        let (service, user_id, analytics) = service_with_user().await;
        let err = service
            .add(&user_id, JournalCategory::Thoughts, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(analytics.calls().is_empty());
    }

    #[tokio::test]
    async fn add_edit_delete_roundtrip() {
        let (service, user_id, analytics) = service_with_user().await;

        let entry = service
            .add(&user_id, JournalCategory::Feelings, "rough morning")
            .await
            .unwrap();
        assert_eq!(entry.updated_at, None);
        assert_eq!(analytics.event_names(), vec!["journal_entry_added"]);

        let edited = service
            .edit(&user_id, &entry.id, "rough morning, better now")
            .await
            .unwrap();
        assert!(edited.updated_at.is_some());

        service.delete(&user_id, &entry.id).await.unwrap();
        assert!(service.list(&user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (service, user_id, _) = service_with_user().await;
        service
            .add(&user_id, JournalCategory::Progress, "first")
            .await
            .unwrap();
        service
            .add(&user_id, JournalCategory::Progress, "second")
            .await
            .unwrap();

        let entries = service.list(&user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].created_at >= entries[1].created_at);
    }
}
