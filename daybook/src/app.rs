//! Application root
//!
//! Wires the auth provider, document store, mutation gateway and live sync
//! store together, and owns teardown. The entry array lives in one place —
//! the [`LiveSyncStore`] held here — and is handed to the view projections
//! explicitly instead of through ambient global state.

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::{require_owner, AuthProvider};
use crate::error::Result;
use crate::services::MutationGateway;
use crate::store::DocumentStore;
use crate::sync::LiveSyncStore;
use crate::views;

/// One signed-in journal session: gateway for mutations, sync store for
/// reads, projection helpers for the three views.
pub struct JournalApp {
    gateway: MutationGateway,
    sync: Arc<LiveSyncStore>,
    owner: String,
}

impl JournalApp {
    /// Resolve the session owner and open the live subscription. Fails
    /// with `Unauthenticated` for signed-out or anonymous sessions and
    /// with `RemoteUnavailable` when the subscription bootstrap gives up.
    pub async fn start(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        let owner = require_owner(auth.as_ref())?;
        tracing::info!("Starting journal session for owner: {}", owner);

        let sync = Arc::new(LiveSyncStore::new());
        sync.start(Arc::clone(&store), &owner).await?;

        Ok(Self {
            gateway: MutationGateway::new(store, auth),
            sync,
            owner,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    pub fn sync(&self) -> &Arc<LiveSyncStore> {
        &self.sync
    }

    /// List view over the current array.
    pub fn list(&self, controls: &views::ListControls) -> Vec<views::EntryCard> {
        views::project_list(&self.sync.snapshot(), controls)
    }

    /// Calendar grid for the selected month, bucketed in local time.
    pub fn calendar_month(&self, year: i32, month: u32) -> views::CalendarMonth {
        let today = Local::now().date_naive();
        views::month_grid(&self.sync.snapshot(), year, month, today, &Local)
    }

    /// Calendar grid for the current month.
    pub fn calendar_current_month(&self) -> views::CalendarMonth {
        let today = Local::now().date_naive();
        self.calendar_month(today.year(), today.month())
    }

    /// Entries of one selected day, newest first, in local time.
    pub fn day_entries(&self, date: NaiveDate) -> Vec<views::EntryCard> {
        views::day_entries(&self.sync.snapshot(), date, &Local)
    }

    /// Trash view with purge countdowns as of now.
    pub fn trash(&self) -> Vec<views::TrashCard> {
        views::project_trash(&self.sync.snapshot(), Utc::now())
    }

    /// Cancel the standing subscription. Call when the owning page goes
    /// away; a dropped app shuts the subscription down as well.
    pub fn shutdown(&self) {
        self.sync.shutdown();
    }
}

/// Install the global tracing subscriber. For embedding applications and
/// integration tests; a no-op when a subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daybook=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
