//! Mutation gateway
//!
//! Validates and issues every write against the document store. Nothing
//! here touches the entry array: a successful mutation becomes visible
//! only when the next snapshot arrives through the live sync store, so
//! callers must tolerate the round-trip delay between "saved" and "shown".

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::{require_owner, AuthProvider};
use crate::config;
use crate::error::{AppError, Result};
use crate::model::{EntryDraft, EntryPatch, MediaPayload};
use crate::store::{DocumentStore, EntryDocument, MediaDocument};

/// Outcome of a create. `media_dropped` flags the partial-success case
/// where the entry saved but its media payload exceeded the document
/// ceiling and was left off; callers surface that as a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReceipt {
    pub id: String,
    pub media_dropped: bool,
}

/// Issues create/update/trash/restore/purge requests for the signed-in
/// owner. All operations are single-shot: no retries, and on failure the
/// remote document is unchanged.
#[derive(Clone)]
pub struct MutationGateway {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    /// Create a new entry. Returns the store-assigned identifier.
    pub async fn create(&self, draft: EntryDraft) -> Result<CreateReceipt> {
        let owner = require_owner(self.auth.as_ref())?;

        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Title is required".to_string()));
        }
        let content = draft.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::InvalidInput("Content is required".to_string()));
        }

        let video_link = normalize_video_link(draft.video_link)?;

        let tags = sanitize_tags(draft.tags);

        let mut media = draft.media;
        let mut media_dropped = false;
        if let Some(att) = &media {
            if let MediaPayload::Inline(data) = &att.payload {
                if data.len() > config::MAX_INLINE_PAYLOAD_BYTES {
                    tracing::warn!(
                        "Media payload of {} bytes exceeds the document ceiling; saving entry without it",
                        data.len()
                    );
                    media = None;
                    media_dropped = true;
                }
            }
        }

        tracing::info!("Creating entry: {}", title);

        let doc = EntryDocument {
            title,
            content,
            tags,
            date: None,          // server-stamped
            last_modified: None, // server-stamped
            deleted: false,
            deleted_date: None,
            video_link,
            media_data: media.as_ref().map(MediaDocument::from_attachment),
            media_type: None,
            media_url: None,
            user_id: String::new(), // server sets the owner
        };

        let id = self
            .store
            .create(&owner, doc)
            .await
            .inspect_err(|err| tracing::error!("Error saving entry: {}", err))?;

        tracing::info!("Entry created successfully: {}", id);
        Ok(CreateReceipt { id, media_dropped })
    }

    /// Merge a partial field set onto an existing entry. `lastModified` is
    /// refreshed by the store; the creation date and owner cannot change.
    pub async fn update(&self, id: &str, mut patch: EntryPatch) -> Result<()> {
        let owner = require_owner(self.auth.as_ref())?;

        if let Some(title) = &patch.title {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(AppError::InvalidInput("Title is required".to_string()));
            }
            patch.title = Some(trimmed.to_string());
        }
        if let Some(content) = &patch.content {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(AppError::InvalidInput("Content is required".to_string()));
            }
            patch.content = Some(trimmed.to_string());
        }
        if let Some(link) = patch.video_link.take() {
            patch.video_link = Some(normalize_video_link(link)?);
        }
        if let Some(tags) = patch.tags.take() {
            patch.tags = Some(sanitize_tags(tags));
        }
        if let Some(Some(att)) = &patch.media {
            if let MediaPayload::Inline(data) = &att.payload {
                if data.len() > config::MAX_INLINE_PAYLOAD_BYTES {
                    return Err(AppError::PayloadTooLarge {
                        size: data.len(),
                        limit: config::MAX_INLINE_PAYLOAD_BYTES,
                    });
                }
            }
        }

        tracing::debug!("Updating entry: {}", id);
        self.store
            .update(&owner, id, patch)
            .await
            .inspect_err(|err| tracing::error!("Error updating entry {}: {}", id, err))?;

        tracing::debug!("Entry updated successfully: {}", id);
        Ok(())
    }

    /// Soft delete: the entry moves to the trash and stays restorable for
    /// the retention window.
    pub async fn move_to_trash(&self, id: &str) -> Result<()> {
        let owner = require_owner(self.auth.as_ref())?;

        tracing::info!("Moving entry to trash: {}", id);
        self.store
            .soft_delete(&owner, id)
            .await
            .inspect_err(|err| tracing::error!("Error moving entry {} to trash: {}", id, err))?;
        Ok(())
    }

    pub async fn restore_from_trash(&self, id: &str) -> Result<()> {
        let owner = require_owner(self.auth.as_ref())?;

        tracing::info!("Restoring entry from trash: {}", id);
        self.store
            .restore(&owner, id)
            .await
            .inspect_err(|err| tracing::error!("Error restoring entry {}: {}", id, err))?;
        Ok(())
    }

    /// Permanent, irreversible removal. The confirmation step lives in the
    /// UI; by the time this is called the user has already agreed.
    pub async fn delete_forever(&self, id: &str) -> Result<()> {
        let owner = require_owner(self.auth.as_ref())?;

        tracing::info!("Permanently deleting entry: {}", id);
        self.store
            .hard_delete(&owner, id)
            .await
            .inspect_err(|err| tracing::error!("Error deleting entry {}: {}", id, err))?;
        Ok(())
    }
}

/// Empty links collapse to none; present links must point at an
/// allow-listed video host.
fn normalize_video_link(link: Option<String>) -> Result<Option<String>> {
    match link {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if !video_host_allowed(trimmed) {
                return Err(AppError::InvalidInput(
                    "Invalid video URL. Only YouTube and Google Drive links are supported."
                        .to_string(),
                ));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn video_host_allowed(link: &str) -> bool {
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    config::ALLOWED_VIDEO_HOSTS
        .iter()
        .any(|host| matches!(rest.strip_prefix(host), Some(tail) if !tail.is_empty()))
}

/// Trim tags and drop anything without the `#` marker, preserving order
/// and duplicates. Mirrors the parse-time filtering of the entry form.
fn sanitize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| tag.starts_with('#'))
        .collect()
}
