//! HTTP document-store client
//!
//! Thin polling client over the journal REST API. The collection lives at
//! `users/{ownerId}/journal-entries`; change notification is emulated by
//! re-fetching on an interval and publishing only when the snapshot
//! actually differs. Transport failures on the standing poll surface as
//! [`StoreEvent::Error`] so the sync layer can keep its last-known-good
//! data instead of clearing it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::watch;

use super::{DocumentStore, EntryDocument, Snapshot, StoreEvent, StoredDocument, Subscription};
use crate::config;
use crate::error::{AppError, Result};
use crate::model::EntryPatch;

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

/// [`DocumentStore`] over the journal REST API.
#[derive(Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn collection_url(&self, owner: &str) -> String {
        format!(
            "{}/users/{}/journal-entries",
            self.base_url.trim_end_matches('/'),
            owner
        )
    }

    fn document_url(&self, owner: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(owner), id)
    }

    async fn fetch_documents(&self, owner: &str) -> Result<Snapshot> {
        let docs: Vec<StoredDocument> = self
            .client
            .get(self.collection_url(owner))
            .send()
            .await
            .map_err(remote)?
            .error_for_status()
            .map_err(remote)?
            .json()
            .await
            .map_err(remote)?;

        Ok(Snapshot::from_documents(docs))
    }

    /// Map a mutation response, translating 404 into the not-found error
    /// the caller reports against the entry id.
    fn check_status(resp: &reqwest::Response, id: &str) -> Result<()> {
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(id.to_string()));
        }
        if !resp.status().is_success() {
            return Err(AppError::RemoteUnavailable(format!(
                "store returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

fn remote(err: reqwest::Error) -> AppError {
    AppError::RemoteUnavailable(err.to_string())
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn fetch(&self, owner: &str) -> Result<Snapshot> {
        self.fetch_documents(owner).await
    }

    async fn subscribe(&self, owner: &str) -> Result<Subscription> {
        // The first fetch happens before the poller exists, so bootstrap
        // failures surface to the caller (which owns the bounded retry).
        let initial = self.fetch_documents(owner).await?;
        let (tx, rx) = watch::channel(StoreEvent::Snapshot(initial.clone()));

        let store = self.clone();
        let owner = owner.to_string();
        let poller = tokio::spawn(async move {
            let mut last = initial;
            let mut interval =
                tokio::time::interval(Duration::from_millis(config::STORE_POLL_INTERVAL_MS));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match store.fetch_documents(&owner).await {
                    Ok(snapshot) => {
                        if snapshot != last {
                            last = snapshot.clone();
                            tx.send_replace(StoreEvent::Snapshot(snapshot));
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Poll of journal collection failed: {}", err);
                        tx.send_replace(StoreEvent::Error(err.to_string()));
                    }
                }
            }
        });

        Ok(Subscription::with_poller(rx, poller))
    }

    async fn create(&self, owner: &str, doc: EntryDocument) -> Result<String> {
        let resp = self
            .client
            .post(self.collection_url(owner))
            .json(&doc)
            .send()
            .await
            .map_err(remote)?
            .error_for_status()
            .map_err(remote)?;

        let created: CreatedResponse = resp.json().await.map_err(remote)?;
        tracing::debug!("Created document: {}", created.id);
        Ok(created.id)
    }

    async fn update(&self, owner: &str, id: &str, patch: EntryPatch) -> Result<()> {
        let resp = self
            .client
            .patch(self.document_url(owner, id))
            .json(&patch)
            .send()
            .await
            .map_err(remote)?;
        Self::check_status(&resp, id)
    }

    async fn soft_delete(&self, owner: &str, id: &str) -> Result<()> {
        let url = format!("{}/trash", self.document_url(owner, id));
        let resp = self.client.post(url).send().await.map_err(remote)?;
        Self::check_status(&resp, id)
    }

    async fn restore(&self, owner: &str, id: &str) -> Result<()> {
        let url = format!("{}/restore", self.document_url(owner, id));
        let resp = self.client.post(url).send().await.map_err(remote)?;
        Self::check_status(&resp, id)
    }

    async fn hard_delete(&self, owner: &str, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.document_url(owner, id))
            .send()
            .await
            .map_err(remote)?;
        // Deleting an already-gone document is success, as with the
        // in-process store.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(&resp, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_url_is_owner_scoped() {
        let store = HttpStore::new("https://api.example/v1/");
        assert_eq!(
            store.collection_url("u1"),
            "https://api.example/v1/users/u1/journal-entries"
        );
        assert_eq!(
            store.document_url("u1", "abc"),
            "https://api.example/v1/users/u1/journal-entries/abc"
        );
    }

    #[test]
    fn test_envelope_deserializes_flattened_document() {
        let json = r#"[{"id":"d1","title":"t","content":"c","deleted":false,"deletedDate":null,"userId":"u1"}]"#;
        let docs: Vec<StoredDocument> = serde_json::from_str(json).unwrap();
        assert_eq!(docs[0].id, "d1");
        assert_eq!(docs[0].doc.title, "t");
    }
}
