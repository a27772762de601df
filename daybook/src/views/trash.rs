//! Trash view
//!
//! Soft-deleted entries, most recently deleted first, each showing how
//! many days remain before the retention window closes. The countdown is
//! display-only; removal is the purge service's job.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config;
use crate::model::{Entry, MediaAttachment};

/// One rendered trash card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrashCard {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub media: Option<MediaAttachment>,
    /// Deletion time shown on the card; creation date for legacy
    /// documents trashed without one.
    pub deleted_at: DateTime<Utc>,
    /// Whole days until purge, clamped at zero.
    pub days_left: i64,
}

/// Days remaining before an entry deleted at `deleted_at` is eligible for
/// purge, as displayed: `max(0, 30 - floor(days since deletion))`.
pub fn days_left(deleted_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (config::TRASH_RETENTION_DAYS - (now - deleted_at).num_days()).max(0)
}

/// Project the entry array into trash cards.
pub fn project_trash(entries: &[Entry], now: DateTime<Utc>) -> Vec<TrashCard> {
    let mut trashed: Vec<(&Entry, DateTime<Utc>)> = entries
        .iter()
        .filter_map(|entry| entry.deleted_at_effective().map(|at| (entry, at)))
        .collect();

    trashed.sort_by(|a, b| b.1.cmp(&a.1));

    trashed
        .into_iter()
        .map(|(entry, deleted_at)| TrashCard {
            id: entry.id.clone(),
            title: entry.title.clone(),
            content: entry.content.clone(),
            tags: entry.tags.clone(),
            media: entry.media.clone(),
            deleted_at,
            days_left: days_left(deleted_at, now),
        })
        .collect()
}
