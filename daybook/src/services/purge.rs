//! Trash purge service
//!
//! The trash view only displays the retention countdown; actually removing
//! expired entries is this opt-in background sweep. Embedders that prefer a
//! server-side purge simply never start it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::config;
use crate::error::{AppError, Result};
use crate::store::DocumentStore;
use crate::sync::normalize;

/// Hard-delete every trashed entry whose retention window has elapsed.
/// Returns the number of entries removed.
pub async fn sweep_expired(
    store: &dyn DocumentStore,
    owner: &str,
    now: DateTime<Utc>,
) -> Result<usize> {
    let cutoff = now - Duration::days(config::TRASH_RETENTION_DAYS);
    let snapshot = store.fetch(owner).await?;

    let mut removed = 0;
    for stored in &snapshot.docs {
        let entry = normalize(&stored.id, &stored.doc);
        let Some(deleted_at) = entry.deleted_at_effective() else {
            continue;
        };
        if deleted_at < cutoff {
            tracing::info!("Purging expired trash entry: {}", stored.id);
            store.hard_delete(owner, &stored.id).await?;
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::info!("Trash sweep removed {} entries", removed);
    }
    Ok(removed)
}

/// Scheduler wrapper running [`sweep_expired`] on a cron cadence.
pub struct PurgeService {
    scheduler: Arc<RwLock<JobScheduler>>,
    store: Arc<dyn DocumentStore>,
    owner: String,
    current_job_id: Arc<RwLock<Option<Uuid>>>,
}

impl PurgeService {
    pub async fn new(store: Arc<dyn DocumentStore>, owner: impl Into<String>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            store,
            owner: owner.into(),
            current_job_id: Arc::new(RwLock::new(None)),
        })
    }

    /// Start the scheduler loop.
    pub async fn start(&self) -> Result<()> {
        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {e}")))?;
        tracing::info!("Trash purge scheduler started");
        Ok(())
    }

    /// Schedule the daily sweep, replacing any existing schedule.
    pub async fn schedule_sweep(&self) -> Result<()> {
        self.cancel_sweep().await?;

        let store = Arc::clone(&self.store);
        let owner = self.owner.clone();

        let job = Job::new_async(config::TRASH_SWEEP_CRON, move |_uuid, _lock| {
            let store = Arc::clone(&store);
            let owner = owner.clone();
            Box::pin(async move {
                tracing::info!("Running scheduled trash sweep");
                match sweep_expired(store.as_ref(), &owner, Utc::now()).await {
                    Ok(removed) => {
                        tracing::info!("Scheduled trash sweep complete: {} removed", removed);
                    }
                    Err(err) => {
                        tracing::error!("Scheduled trash sweep failed: {}", err);
                    }
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create sweep job: {e}")))?;

        let job_id = job.guid();

        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to schedule sweep: {e}")))?;

        let mut current_job = self.current_job_id.write().await;
        *current_job = Some(job_id);

        tracing::info!("Trash sweep scheduled ({})", config::TRASH_SWEEP_CRON);
        Ok(())
    }

    /// Cancel the scheduled sweep if one exists.
    pub async fn cancel_sweep(&self) -> Result<()> {
        let mut current_job = self.current_job_id.write().await;

        if let Some(job_id) = *current_job {
            let scheduler = self.scheduler.write().await;
            scheduler
                .remove(&job_id)
                .await
                .map_err(|e| AppError::Scheduler(format!("Failed to remove sweep job: {e}")))?;

            *current_job = None;
            tracing::info!("Trash sweep schedule cancelled");
        }

        Ok(())
    }

    /// Shutdown scheduler gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {e}")))?;
        tracing::info!("Trash purge scheduler shutdown");
        Ok(())
    }
}
