//! Live sync store
//!
//! Single source of truth for the entry array the views render from. A
//! standing subscription delivers snapshots; each one discards and rebuilds
//! the whole array through the normalizer — no diffing against the previous
//! state, so the array is never a partially-applied merge of stale and
//! fresh documents. Registered listeners are then invoked synchronously in
//! registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config;
use crate::error::Result;
use crate::model::Entry;
use crate::store::{DocumentStore, Snapshot, StoreEvent};
use crate::sync::normalize;

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type RefreshListener = Box<dyn Fn(&[Entry]) + Send + Sync>;
type ErrorListener = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct SyncState {
    entries: RwLock<Vec<Entry>>,
    listeners: Mutex<Vec<(u64, RefreshListener)>>,
    error_listeners: Mutex<Vec<(u64, ErrorListener)>>,
}

impl SyncState {
    fn apply_event(&self, event: StoreEvent) {
        match event {
            StoreEvent::Snapshot(snapshot) => self.rebuild(&snapshot),
            StoreEvent::Error(message) => {
                // Last-known-good data stays; the array is never cleared
                // because the backend went away.
                tracing::error!("Journal subscription error: {}", message);
                let listeners = self.error_listeners.lock().unwrap();
                for (_, listener) in listeners.iter() {
                    listener(&message);
                }
            }
        }
    }

    fn rebuild(&self, snapshot: &Snapshot) {
        let rebuilt: Vec<Entry> = snapshot
            .docs
            .iter()
            .map(|stored| normalize(&stored.id, &stored.doc))
            .collect();

        tracing::debug!("Rebuilt entry array: {} entries", rebuilt.len());
        *self.entries.write().unwrap() = rebuilt;

        let entries = self.entries.read().unwrap();
        let listeners = self.listeners.lock().unwrap();
        for (_, listener) in listeners.iter() {
            listener(&entries);
        }
    }
}

/// Owner of the shared entry array. Construct once at the application
/// root, register the view refreshers, then [`start`](Self::start) it; it
/// keeps the array current until [`shutdown`](Self::shutdown) or drop.
pub struct LiveSyncStore {
    state: Arc<SyncState>,
    next_listener_id: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for LiveSyncStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveSyncStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SyncState::default()),
            next_listener_id: AtomicU64::new(1),
            task: Mutex::new(None),
        }
    }

    /// Open the standing subscription for `owner` and begin mirroring it.
    /// The initial snapshot is applied before this returns, so the array
    /// is populated once `start` succeeds. Bootstrap failures are retried
    /// a bounded number of times with backoff; this is the only retry
    /// anywhere in the core.
    pub async fn start(&self, store: Arc<dyn DocumentStore>, owner: &str) -> Result<()> {
        // Re-starting replaces any previous subscription.
        self.shutdown();

        let mut subscription = {
            let mut attempt = 0;
            loop {
                match store.subscribe(owner).await {
                    Ok(sub) => break sub,
                    Err(err) if attempt + 1 < config::SUBSCRIBE_RETRY_ATTEMPTS => {
                        attempt += 1;
                        tracing::warn!(
                            "Subscription bootstrap failed (attempt {}): {}",
                            attempt,
                            err
                        );
                        tokio::time::sleep(Duration::from_millis(
                            config::SUBSCRIBE_RETRY_BASE_MS * u64::from(attempt),
                        ))
                        .await;
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        self.state.apply_event(subscription.current());

        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                state.apply_event(event);
            }
            tracing::debug!("Journal subscription closed");
        });

        *self.task.lock().unwrap() = Some(task);
        tracing::info!("Live sync started for owner: {}", owner);
        Ok(())
    }

    /// Current entry array, in the store's query order (date descending).
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries().clone()
    }

    fn entries(&self) -> std::sync::RwLockReadGuard<'_, Vec<Entry>> {
        self.state.entries.read().unwrap()
    }

    /// Register a view refresher. Listeners run synchronously, in
    /// registration order, after every rebuild; they must not register or
    /// unregister listeners from within the callback.
    pub fn register_listener(
        &self,
        listener: impl Fn(&[Entry]) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.state
            .listeners
            .lock()
            .unwrap()
            .push((id, Box::new(listener)));
        ListenerId(id)
    }

    /// Register for subscription errors (user-visible notification text).
    pub fn register_error_listener(
        &self,
        listener: impl Fn(&str) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.state
            .error_listeners
            .lock()
            .unwrap()
            .push((id, Box::new(listener)));
        ListenerId(id)
    }

    pub fn unregister(&self, id: ListenerId) {
        self.state
            .listeners
            .lock()
            .unwrap()
            .retain(|(lid, _)| *lid != id.0);
        self.state
            .error_listeners
            .lock()
            .unwrap()
            .retain(|(lid, _)| *lid != id.0);
    }

    /// Cancel the standing subscription. Without this (or drop), the
    /// subscription would keep a listener open against the store for the
    /// life of the process.
    pub fn shutdown(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            tracing::info!("Live sync shut down");
        }
    }
}

impl Drop for LiveSyncStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocTimestamp, EntryDocument, MemoryStore, StoredDocument};
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;

    fn doc(title: &str) -> EntryDocument {
        EntryDocument {
            title: title.to_string(),
            content: "c".to_string(),
            date: Some(DocTimestamp::from_utc(Utc::now())),
            last_modified: Some(DocTimestamp::from_utc(Utc::now())),
            ..Default::default()
        }
    }

    #[test]
    fn test_rebuild_replaces_array_and_notifies_in_order() {
        let state = SyncState::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["list", "trash", "calendar"] {
            let order = Arc::clone(&order);
            state
                .listeners
                .lock()
                .unwrap()
                .push((0, Box::new(move |_: &[Entry]| {
                    order.lock().unwrap().push(name);
                })));
        }

        let snapshot = Snapshot::from_documents(vec![StoredDocument {
            id: "d1".into(),
            doc: doc("A"),
        }]);
        state.apply_event(StoreEvent::Snapshot(snapshot));

        assert_eq!(state.entries.read().unwrap().len(), 1);
        assert_eq!(*order.lock().unwrap(), vec!["list", "trash", "calendar"]);
    }

    #[test]
    fn test_error_event_keeps_last_known_good_array() {
        let state = SyncState::default();
        let errors = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&errors);
        state
            .error_listeners
            .lock()
            .unwrap()
            .push((0, Box::new(move |_: &str| {
                seen.fetch_add(1, Ordering::SeqCst);
            })));

        let snapshot = Snapshot::from_documents(vec![StoredDocument {
            id: "d1".into(),
            doc: doc("A"),
        }]);
        state.apply_event(StoreEvent::Snapshot(snapshot));
        state.apply_event(StoreEvent::Error("permission denied".into()));

        assert_eq!(state.entries.read().unwrap().len(), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_populates_snapshot_immediately() {
        let store = Arc::new(MemoryStore::new());
        store.create("u1", doc("existing")).await.unwrap();

        let sync = LiveSyncStore::new();
        sync.start(store.clone(), "u1").await.unwrap();

        let entries = sync.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "existing");
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_remote_change_triggers_listener() {
        let store = Arc::new(MemoryStore::new());
        let sync = LiveSyncStore::new();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        sync.register_listener(move |entries: &[Entry]| {
            let _ = tx.send(entries.len());
        });

        sync.start(store.clone(), "u1").await.unwrap();
        // Initial empty snapshot.
        assert_eq!(rx.recv().await, Some(0));

        store.create("u1", doc("A")).await.unwrap();
        let seen = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("listener did not fire")
            .unwrap();
        assert_eq!(seen, 1);
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_unregister_stops_notifications() {
        let store = Arc::new(MemoryStore::new());
        let sync = LiveSyncStore::new();

        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = sync.register_listener(move |_: &[Entry]| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        sync.start(store.clone(), "u1").await.unwrap();
        let after_start = count.load(Ordering::SeqCst);
        assert_eq!(after_start, 1);

        sync.unregister(id);
        store.create("u1", doc("A")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_start);
        sync.shutdown();
    }
}
