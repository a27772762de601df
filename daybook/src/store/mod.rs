//! Document store seam
//!
//! The journal core reads and writes entries through [`DocumentStore`],
//! never against a concrete backend. Two implementations ship: an
//! in-process [`MemoryStore`] for tests and single-user local setups, and
//! the HTTP polling client [`HttpStore`]. Timestamp stamping (`date`,
//! `lastModified`, `deletedDate`) is the store's job, mirroring
//! server-assigned timestamps; callers never supply their own clock.

pub mod document;
pub mod http;
pub mod memory;

pub use document::{DocTimestamp, EntryDocument, MediaDocument};
pub use http::HttpStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::model::EntryPatch;

/// A document plus its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    #[serde(flatten)]
    pub doc: EntryDocument,
}

/// Full point-in-time result set for one owner's collection, ordered by
/// creation date descending (the collection's query order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub docs: Vec<StoredDocument>,
}

impl Snapshot {
    /// Build a snapshot in query order: `date` descending, ties broken by
    /// id so repeated fetches of identical data compare equal.
    pub fn from_documents(mut docs: Vec<StoredDocument>) -> Self {
        docs.sort_by(|a, b| {
            let ka = a.doc.date.as_ref().and_then(DocTimestamp::to_utc);
            let kb = b.doc.date.as_ref().and_then(DocTimestamp::to_utc);
            kb.cmp(&ka).then_with(|| a.id.cmp(&b.id))
        });
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// What a standing subscription delivers: fresh snapshots, or a transport
/// error report. Errors never carry a snapshot; the consumer keeps its
/// last-known-good data.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Snapshot(Snapshot),
    Error(String),
}

/// Handle on a standing collection subscription. Dropping it tears the
/// subscription down, including any background poller feeding it.
pub struct Subscription {
    receiver: watch::Receiver<StoreEvent>,
    poller: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(receiver: watch::Receiver<StoreEvent>) -> Self {
        Self {
            receiver,
            poller: None,
        }
    }

    pub fn with_poller(receiver: watch::Receiver<StoreEvent>, poller: JoinHandle<()>) -> Self {
        Self {
            receiver,
            poller: Some(poller),
        }
    }

    /// Latest event, marking it seen.
    pub fn current(&mut self) -> StoreEvent {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait for the next unseen event. `None` once the store side has gone
    /// away and no further events can arrive.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

/// Owner-scoped document operations. All mutations are single-shot; on
/// failure the remote document is unchanged.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One-off read of the owner's collection in query order.
    async fn fetch(&self, owner: &str) -> Result<Snapshot>;

    /// Open a standing subscription whose initial event is the current
    /// snapshot.
    async fn subscribe(&self, owner: &str) -> Result<Subscription>;

    /// Insert a new document. The store stamps `date` and `lastModified`
    /// with the current server time and overwrites `userId` with the
    /// owner; whatever the caller put in those fields is ignored.
    async fn create(&self, owner: &str, doc: EntryDocument) -> Result<String>;

    /// Merge a partial field set onto an existing document, refreshing
    /// `lastModified`.
    async fn update(&self, owner: &str, id: &str, patch: EntryPatch) -> Result<()>;

    /// Flag the document deleted and stamp `deletedDate`.
    async fn soft_delete(&self, owner: &str, id: &str) -> Result<()>;

    /// Clear the deleted flag and `deletedDate`.
    async fn restore(&self, owner: &str, id: &str) -> Result<()>;

    /// Remove the document permanently. Idempotent: deleting an id that is
    /// already gone succeeds.
    async fn hard_delete(&self, owner: &str, id: &str) -> Result<()>;
}
