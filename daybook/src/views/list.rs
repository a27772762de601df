//! List view
//!
//! Summary cards for all live entries, with substring search across
//! title/content/tags and a two-position date sort toggle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{video_embed, VideoEmbed};
use crate::model::{Entry, MediaAttachment};

/// Two-position sort toggle, newest first by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::Newest,
        }
    }
}

/// Transient UI controls for the list view.
#[derive(Debug, Clone, Default)]
pub struct ListControls {
    /// Case-insensitive substring matched against title, content and tags.
    pub search: Option<String>,
    pub sort: SortOrder,
}

/// One rendered summary card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryCard {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub media: Option<MediaAttachment>,
    pub video: Option<VideoEmbed>,
}

impl EntryCard {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            content: entry.content.clone(),
            tags: entry.tags.clone(),
            date: entry.date,
            last_modified: entry.last_modified,
            media: entry.media.clone(),
            video: entry.video_link.as_deref().map(video_embed),
        }
    }
}

/// Project the entry array into list cards.
pub fn project_list(entries: &[Entry], controls: &ListControls) -> Vec<EntryCard> {
    let needle = controls
        .search
        .as_deref()
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty());

    let mut visible: Vec<&Entry> = entries
        .iter()
        .filter(|entry| !entry.deleted)
        .filter(|entry| match &needle {
            None => true,
            Some(needle) => matches_search(entry, needle),
        })
        .collect();

    // Vec::sort_by is stable, so re-sorting an already-sorted array by the
    // same key leaves it unchanged.
    match controls.sort {
        SortOrder::Newest => visible.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::Oldest => visible.sort_by(|a, b| a.date.cmp(&b.date)),
    }

    visible.into_iter().map(EntryCard::from_entry).collect()
}

fn matches_search(entry: &Entry, needle: &str) -> bool {
    entry.title.to_lowercase().contains(needle)
        || entry.content.to_lowercase().contains(needle)
        || entry
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}
