//! Wire-format documents
//!
//! Shape of an entry as the document store holds it. Field names follow the
//! collection's camelCase convention; timestamps arrive either as RFC 3339
//! strings or as the provider's native `{seconds, nanos}` objects, and older
//! writers flattened the media attachment into two scalar fields. The
//! normalizer folds all of that into the canonical [`crate::model::Entry`].

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{MediaAttachment, MediaPayload};

/// One stored document, as serialized in the owner's collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDocument {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DocTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DocTimestamp>,
    #[serde(default)]
    pub deleted: bool,
    /// Serialized even when null; a live entry explicitly has no deletion
    /// date rather than omitting the field.
    #[serde(default)]
    pub deleted_date: Option<DocTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    /// Nested media shape written by current clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_data: Option<MediaDocument>,
    /// Flattened media shape left behind by older writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default)]
    pub user_id: String,
}

/// Nested media field: a type tag plus exactly one of an inline data URL
/// or an asset-host URL. The type tag is kept as a raw string so documents
/// with media kinds this client does not render still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDocument {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl MediaDocument {
    pub fn from_attachment(att: &MediaAttachment) -> Self {
        let (data, url) = match &att.payload {
            MediaPayload::Inline(data) => (Some(data.clone()), None),
            MediaPayload::Url(url) => (None, Some(url.clone())),
        };
        Self {
            kind: att.kind.as_str().to_string(),
            data,
            url,
        }
    }
}

/// A store timestamp in either of its wire representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocTimestamp {
    Rfc3339(String),
    Provider { seconds: i64, nanos: u32 },
}

impl DocTimestamp {
    /// Parse into a UTC instant; malformed values map to `None` rather
    /// than failing the whole document.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            DocTimestamp::Rfc3339(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            DocTimestamp::Provider { seconds, nanos } => {
                Utc.timestamp_opt(*seconds, *nanos).single()
            }
        }
    }

    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        DocTimestamp::Rfc3339(dt.to_rfc3339())
    }

    /// Provider-native representation, as the store itself stamps
    /// server-side timestamps.
    pub fn provider_now(dt: DateTime<Utc>) -> Self {
        DocTimestamp::Provider {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_both_wire_forms_parse_to_same_instant() {
        let dt = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        let as_string = DocTimestamp::Rfc3339(dt.to_rfc3339());
        let as_object = DocTimestamp::provider_now(dt);
        assert_eq!(as_string.to_utc(), Some(dt));
        assert_eq!(as_object.to_utc(), Some(dt));
    }

    #[test]
    fn test_malformed_timestamp_is_none() {
        assert_eq!(DocTimestamp::Rfc3339("yesterday".into()).to_utc(), None);
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = EntryDocument {
            title: "A".into(),
            content: "B".into(),
            tags: vec!["#t".into()],
            date: Some(DocTimestamp::Provider {
                seconds: 1_700_000_000,
                nanos: 0,
            }),
            last_modified: Some(DocTimestamp::Rfc3339("2023-11-14T22:13:20Z".into())),
            deleted: false,
            deleted_date: None,
            video_link: None,
            media_data: None,
            media_type: Some("image".into()),
            media_url: Some("https://assets.example/images/1_a.jpg".into()),
            user_id: "u1".into(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: EntryDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
        // A live document still spells out the null deletion date.
        assert!(json.contains("\"deletedDate\":null"));
    }

    #[test]
    fn test_unknown_media_kind_still_deserializes() {
        let json = r#"{"title":"t","content":"c","mediaData":{"type":"video","data":"data:video/mp4;base64,xx"}}"#;
        let doc: EntryDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.media_data.unwrap().kind, "video");
    }
}
