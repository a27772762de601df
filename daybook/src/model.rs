//! Canonical entry model
//!
//! In-memory representation of a journal entry, as produced by the
//! normalizer and consumed by the view projections. All models use serde
//! for serialization to a frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned opaque identifier; primary key for all mutations.
    pub id: String,
    pub title: String,
    pub content: String,
    /// `#`-prefixed tags, in input order, duplicates preserved.
    pub tags: Vec<String>,
    /// Creation time, server-assigned, immutable after creation.
    pub date: DateTime<Utc>,
    /// Refreshed by the store on every successful update.
    pub last_modified: DateTime<Utc>,
    pub deleted: bool,
    /// `Some` exactly while the entry sits in the trash.
    pub deleted_date: Option<DateTime<Utc>>,
    pub media: Option<MediaAttachment>,
    /// External video URL, restricted to the allow-listed hosts.
    pub video_link: Option<String>,
}

impl Entry {
    /// Deletion timestamp used for trash ordering and the purge countdown.
    /// Falls back to the creation date for legacy documents that were
    /// trashed without a `deletedDate`.
    pub fn deleted_at_effective(&self) -> Option<DateTime<Utc>> {
        if self.deleted {
            Some(self.deleted_date.unwrap_or(self.date))
        } else {
            None
        }
    }
}

/// At most one media attachment per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAttachment {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(flatten)]
    pub payload: MediaPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// Either an inline data-URL payload or a URL on the asset host. The two
/// are distinct representations and never combined within one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaPayload {
    #[serde(rename = "data")]
    Inline(String),
    #[serde(rename = "url")]
    Url(String),
}

/// Input for [`crate::services::gateway::MutationGateway::create`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub video_link: Option<String>,
    #[serde(default)]
    pub media: Option<MediaAttachment>,
}

/// Partial field set for an update. The creation date and owner id have no
/// representation here, which is what makes them unchangeable.
///
/// Outer `None` means "leave unchanged"; `Some(None)` on the nested options
/// clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_link: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Option<MediaAttachment>>,
}

/// Split raw tag input into `#`-prefixed tags, preserving order and
/// duplicates. Words without the marker are dropped, not rejected.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .filter(|tag| tag.starts_with('#'))
        .map(str::to_string)
        .collect()
}
