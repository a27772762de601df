//! Entry normalizer
//!
//! Converts one raw stored document into the canonical [`Entry`] shape:
//! provider timestamps become UTC instants, flattened media fields are
//! folded back into a single attachment, and the deleted/deletedDate pair
//! is made consistent. Pure: same input, same output, no clock or network.

use chrono::{DateTime, Utc};

use crate::model::{Entry, MediaAttachment, MediaKind, MediaPayload};
use crate::store::{DocTimestamp, EntryDocument, MediaDocument};

/// Build the canonical entry for a stored document.
pub fn normalize(id: &str, doc: &EntryDocument) -> Entry {
    let date = doc
        .date
        .as_ref()
        .and_then(DocTimestamp::to_utc)
        .or_else(|| doc.last_modified.as_ref().and_then(DocTimestamp::to_utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    // lastModified can never precede creation; documents written before
    // the field existed simply inherit the creation date.
    let last_modified = doc
        .last_modified
        .as_ref()
        .and_then(DocTimestamp::to_utc)
        .unwrap_or(date)
        .max(date);

    // A stray deletedDate on a live document is dropped; a trashed
    // document without one keeps None and sorts by creation date.
    let deleted_date = if doc.deleted {
        doc.deleted_date.as_ref().and_then(DocTimestamp::to_utc)
    } else {
        None
    };

    Entry {
        id: id.to_string(),
        title: doc.title.clone(),
        content: doc.content.clone(),
        tags: doc.tags.clone(),
        date,
        last_modified,
        deleted: doc.deleted,
        deleted_date,
        media: normalize_media(doc),
        video_link: doc.video_link.clone(),
    }
}

fn normalize_media(doc: &EntryDocument) -> Option<MediaAttachment> {
    if let Some(media) = &doc.media_data {
        return attachment_from_document(media);
    }
    // Older writers stored the attachment as two scalar fields.
    match (&doc.media_type, &doc.media_url) {
        (Some(kind), Some(payload)) => attachment_from_parts(kind, payload),
        _ => None,
    }
}

fn attachment_from_document(media: &MediaDocument) -> Option<MediaAttachment> {
    let payload = media.data.as_deref().or(media.url.as_deref())?;
    attachment_from_parts(&media.kind, payload)
}

fn attachment_from_parts(kind: &str, payload: &str) -> Option<MediaAttachment> {
    let kind = MediaKind::parse(kind)?;
    let payload = if payload.starts_with("data:") {
        MediaPayload::Inline(payload.to_string())
    } else {
        MediaPayload::Url(payload.to_string())
    };
    Some(MediaAttachment { kind, payload })
}

/// Inverse of [`normalize`]: the wire document for a canonical entry,
/// written in the current (nested media, RFC 3339 timestamps) shape.
pub fn entry_document(entry: &Entry, owner: &str) -> EntryDocument {
    EntryDocument {
        title: entry.title.clone(),
        content: entry.content.clone(),
        tags: entry.tags.clone(),
        date: Some(DocTimestamp::from_utc(entry.date)),
        last_modified: Some(DocTimestamp::from_utc(entry.last_modified)),
        deleted: entry.deleted,
        deleted_date: entry.deleted_date.map(DocTimestamp::from_utc),
        video_link: entry.video_link.clone(),
        media_data: entry.media.as_ref().map(MediaDocument::from_attachment),
        media_type: None,
        media_url: None,
        user_id: owner.to_string(),
    }
}
