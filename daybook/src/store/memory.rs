//! In-process document store
//!
//! Backs tests and single-user local setups with the same contract as the
//! remote store: server-side timestamp stamping, owner-scoped collections,
//! and snapshot fan-out to subscribers on every change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use super::{
    DocTimestamp, DocumentStore, EntryDocument, MediaDocument, Snapshot, StoreEvent,
    StoredDocument, Subscription,
};
use crate::error::{AppError, Result};
use crate::model::EntryPatch;

struct OwnerCollection {
    docs: HashMap<String, EntryDocument>,
    tx: watch::Sender<StoreEvent>,
}

impl OwnerCollection {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(StoreEvent::Snapshot(Snapshot::default()));
        Self {
            docs: HashMap::new(),
            tx,
        }
    }

    fn snapshot(&self) -> Snapshot {
        let docs = self
            .docs
            .iter()
            .map(|(id, doc)| StoredDocument {
                id: id.clone(),
                doc: doc.clone(),
            })
            .collect();
        Snapshot::from_documents(docs)
    }

    fn publish(&self) {
        self.tx.send_replace(StoreEvent::Snapshot(self.snapshot()));
    }
}

/// In-memory [`DocumentStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, OwnerCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collection<R>(&self, owner: &str, f: impl FnOnce(&mut OwnerCollection) -> R) -> R {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .entry(owner.to_string())
            .or_insert_with(OwnerCollection::new);
        f(collection)
    }

    /// Insert a document exactly as given, without stamping. Fixture
    /// helper for tests and local imports that need historic timestamps.
    pub fn seed(&self, owner: &str, doc: EntryDocument) -> String {
        let id = Uuid::new_v4().to_string();
        self.with_collection(owner, |collection| {
            collection.docs.insert(id.clone(), doc);
            collection.publish();
        });
        id
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, owner: &str) -> Result<Snapshot> {
        Ok(self.with_collection(owner, |collection| collection.snapshot()))
    }

    async fn subscribe(&self, owner: &str) -> Result<Subscription> {
        Ok(self.with_collection(owner, |collection| {
            // Receivers created after mutations still start from the
            // current state: refresh the channel before handing it out.
            collection.publish();
            Subscription::new(collection.tx.subscribe())
        }))
    }

    async fn create(&self, owner: &str, mut doc: EntryDocument) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = DocTimestamp::provider_now(Utc::now());

        doc.date = Some(now.clone());
        doc.last_modified = Some(now);
        doc.user_id = owner.to_string();

        self.with_collection(owner, |collection| {
            collection.docs.insert(id.clone(), doc);
            collection.publish();
        });

        tracing::debug!("Created document: {}", id);
        Ok(id)
    }

    async fn update(&self, owner: &str, id: &str, patch: EntryPatch) -> Result<()> {
        self.with_collection(owner, |collection| {
            let doc = collection
                .docs
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(id.to_string()))?;

            if let Some(title) = patch.title {
                doc.title = title;
            }
            if let Some(content) = patch.content {
                doc.content = content;
            }
            if let Some(tags) = patch.tags {
                doc.tags = tags;
            }
            if let Some(video_link) = patch.video_link {
                doc.video_link = video_link;
            }
            if let Some(media) = patch.media {
                // Writes use the nested shape; drop any flattened leftovers
                // from an older writer.
                doc.media_data = media.as_ref().map(MediaDocument::from_attachment);
                doc.media_type = None;
                doc.media_url = None;
            }
            doc.last_modified = Some(DocTimestamp::provider_now(Utc::now()));

            collection.publish();
            Ok::<(), AppError>(())
        })?;

        tracing::debug!("Updated document: {}", id);
        Ok(())
    }

    async fn soft_delete(&self, owner: &str, id: &str) -> Result<()> {
        self.with_collection(owner, |collection| {
            let doc = collection
                .docs
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(id.to_string()))?;

            doc.deleted = true;
            doc.deleted_date = Some(DocTimestamp::provider_now(Utc::now()));

            collection.publish();
            Ok::<(), AppError>(())
        })?;

        tracing::debug!("Soft deleted document: {}", id);
        Ok(())
    }

    async fn restore(&self, owner: &str, id: &str) -> Result<()> {
        self.with_collection(owner, |collection| {
            let doc = collection
                .docs
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(id.to_string()))?;

            doc.deleted = false;
            doc.deleted_date = None;

            collection.publish();
            Ok::<(), AppError>(())
        })?;

        tracing::debug!("Restored document: {}", id);
        Ok(())
    }

    async fn hard_delete(&self, owner: &str, id: &str) -> Result<()> {
        self.with_collection(owner, |collection| {
            if collection.docs.remove(id).is_some() {
                collection.publish();
            }
        });

        tracing::debug!("Hard deleted document: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_doc(title: &str) -> EntryDocument {
        EntryDocument {
            title: title.to_string(),
            content: "content".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_stamps_server_fields() {
        let store = MemoryStore::new();
        let id = store.create("u1", draft_doc("A")).await.unwrap();

        let snap = store.fetch("u1").await.unwrap();
        assert_eq!(snap.len(), 1);
        let stored = &snap.docs[0];
        assert_eq!(stored.id, id);
        assert_eq!(stored.doc.user_id, "u1");
        assert!(stored.doc.date.is_some());
        assert_eq!(stored.doc.date, stored.doc.last_modified);
    }

    #[tokio::test]
    async fn test_collections_are_owner_scoped() {
        let store = MemoryStore::new();
        store.create("u1", draft_doc("mine")).await.unwrap();

        assert_eq!(store.fetch("u1").await.unwrap().len(), 1);
        assert!(store.fetch("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_ordered_by_date_descending() {
        let store = MemoryStore::new();
        store.create("u1", draft_doc("older")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create("u1", draft_doc("newer")).await.unwrap();

        let snap = store.fetch("u1").await.unwrap();
        assert_eq!(snap.docs[0].doc.title, "newer");
        assert_eq!(snap.docs[1].doc.title, "older");
    }

    #[tokio::test]
    async fn test_update_refreshes_last_modified_only() {
        let store = MemoryStore::new();
        let id = store.create("u1", draft_doc("A")).await.unwrap();
        let before = store.fetch("u1").await.unwrap().docs[0].doc.clone();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .update(
                "u1",
                &id,
                EntryPatch {
                    title: Some("B".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let after = store.fetch("u1").await.unwrap().docs[0].doc.clone();
        assert_eq!(after.title, "B");
        assert_eq!(after.date, before.date);
        assert_ne!(after.last_modified, before.last_modified);
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("u1", "no-such-id", EntryPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let store = MemoryStore::new();
        let id = store.create("u1", draft_doc("A")).await.unwrap();

        store.soft_delete("u1", &id).await.unwrap();
        let doc = store.fetch("u1").await.unwrap().docs[0].doc.clone();
        assert!(doc.deleted);
        assert!(doc.deleted_date.is_some());

        store.restore("u1", &id).await.unwrap();
        let doc = store.fetch("u1").await.unwrap().docs[0].doc.clone();
        assert!(!doc.deleted);
        assert!(doc.deleted_date.is_none());
    }

    #[tokio::test]
    async fn test_hard_delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.create("u1", draft_doc("A")).await.unwrap();

        store.hard_delete("u1", &id).await.unwrap();
        assert!(store.fetch("u1").await.unwrap().is_empty());
        // Deleting again is not an error.
        store.hard_delete("u1", &id).await.unwrap();
    }

    #[tokio::test]
    async fn test_subscription_delivers_changes() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("u1").await.unwrap();

        match sub.current() {
            StoreEvent::Snapshot(snap) => assert!(snap.is_empty()),
            StoreEvent::Error(e) => panic!("unexpected error event: {e}"),
        }

        store.create("u1", draft_doc("A")).await.unwrap();
        match sub.next().await.unwrap() {
            StoreEvent::Snapshot(snap) => assert_eq!(snap.len(), 1),
            StoreEvent::Error(e) => panic!("unexpected error event: {e}"),
        }
    }
}
