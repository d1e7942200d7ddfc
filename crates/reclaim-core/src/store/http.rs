//! HTTP client for the hosted document API.
//!
//! Thin JSON wrapper over reqwest. The backend owns query semantics and
//! per-document write serialization; this client only maps HTTP status
//! codes onto the [`StoreError`] taxonomy:
//!
//! - 404 on a by-token lookup means confirmed [`Lookup::Absent`]
//! - 409 on create means [`StoreError::Conflict`] (another writer won)
//! - anything else non-2xx is a [`StoreError::Backend`]
//!
//! Subscriptions are poll-based: the backend has no push channel, so
//! `subscribe_user` re-reads on an interval and publishes changes into a
//! watch channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tokio::sync::watch;
use url::Url;

use crate::error::StoreError;
use crate::model::{DocumentId, JournalCategory, JournalEntry, NewUserRecord, UserRecord};

use super::{Lookup, UserPatch, UserStore};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client for the hosted document store.
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
    poll_interval: Duration,
}

impl RemoteStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
            bearer_token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Override the subscription poll interval (tests use a short one).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Backend(format!("bad endpoint '{path}': {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

async fn status_error(status: StatusCode, response: Response) -> StoreError {
    match status {
        StatusCode::CONFLICT => StoreError::Conflict,
        StatusCode::NOT_FOUND => {
            let path = response.url().path().to_string();
            StoreError::NotFound(path)
        }
        StatusCode::FORBIDDEN => {
            let body = response.text().await.unwrap_or_default();
            StoreError::Forbidden(body)
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            StoreError::Backend(format!("HTTP {status}: {body}"))
        }
    }
}

#[async_trait]
impl UserStore for RemoteStore {
    async fn lookup_user(&self, identity_token: &str) -> Result<Lookup<UserRecord>, StoreError> {
        let url = self.endpoint(&format!("users/by-token/{identity_token}"))?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Lookup::Absent);
        }
        let record = Self::decode::<UserRecord>(response).await?;
        Ok(Lookup::Present(record))
    }

    fn subscribe_user(&self, identity_token: &str) -> watch::Receiver<Lookup<UserRecord>> {
        let (tx, rx) = watch::channel(Lookup::Unknown);
        let store = self.clone();
        let token = identity_token.to_string();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(store.poll_interval);
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    break;
                }
                // Poll errors keep the previous state; the next tick retries.
                if let Ok(state) = store.lookup_user(&token).await {
                    tx.send_if_modified(|current| {
                        if *current != state {
                            *current = state;
                            true
                        } else {
                            false
                        }
                    });
                }
            }
        });
        rx
    }

    async fn create_user(&self, new: NewUserRecord) -> Result<UserRecord, StoreError> {
        let url = self.endpoint("users")?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&new)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn patch_user(
        &self,
        id: &DocumentId,
        patch: UserPatch,
    ) -> Result<UserRecord, StoreError> {
        let url = self.endpoint(&format!("users/{id}"))?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&patch)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl super::JournalStore for RemoteStore {
    async fn add_entry(
        &self,
        user_id: &DocumentId,
        category: JournalCategory,
        content: String,
    ) -> Result<JournalEntry, StoreError> {
        let url = self.endpoint(&format!("users/{user_id}/journal"))?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "category": category, "content": content }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn list_entries(&self, user_id: &DocumentId) -> Result<Vec<JournalEntry>, StoreError> {
        let url = self.endpoint(&format!("users/{user_id}/journal"))?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Self::decode(response).await
    }

    async fn update_entry(
        &self,
        user_id: &DocumentId,
        entry_id: &DocumentId,
        content: String,
    ) -> Result<JournalEntry, StoreError> {
        let url = self.endpoint(&format!("users/{user_id}/journal/{entry_id}"))?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_entry(
        &self,
        user_id: &DocumentId,
        entry_id: &DocumentId,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("users/{user_id}/journal/{entry_id}"))?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }
        Ok(())
    }
}
