//! View projections
//!
//! Pure functions from the shared entry array (plus UI controls) to view
//! models. Every projection re-derives its output from the array on each
//! call; nothing here retains entries between renders.

pub mod calendar;
pub mod list;
pub mod trash;

pub use calendar::{day_entries, month_grid, CalendarDay, CalendarMonth};
pub use list::{project_list, EntryCard, ListControls, SortOrder};
pub use trash::{days_left, project_trash, TrashCard};

use serde::Serialize;

/// Renderable form of an entry's video link. YouTube and Drive links are
/// resolved to embeddable player URLs; anything else (or a link whose id
/// cannot be extracted) falls back to a plain external link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoEmbed {
    Youtube { video_id: String, embed_url: String },
    DriveFile { file_id: String, preview_url: String },
    External { url: String },
}

pub fn video_embed(link: &str) -> VideoEmbed {
    if let Some(rest) = link.split_once("youtube.com/watch?v=").map(|(_, r)| r) {
        let video_id = rest.split(['&', '#']).next().unwrap_or("");
        if !video_id.is_empty() {
            return VideoEmbed::Youtube {
                video_id: video_id.to_string(),
                embed_url: format!("https://www.youtube.com/embed/{video_id}"),
            };
        }
    } else if let Some(rest) = link.split_once("youtu.be/").map(|(_, r)| r) {
        let video_id = rest.split(['?', '&', '#']).next().unwrap_or("");
        if !video_id.is_empty() {
            return VideoEmbed::Youtube {
                video_id: video_id.to_string(),
                embed_url: format!("https://www.youtube.com/embed/{video_id}"),
            };
        }
    } else if link.contains("drive.google.com") {
        if let Some(rest) = link.split_once("/file/d/").map(|(_, r)| r) {
            let file_id = rest.split(['/', '?']).next().unwrap_or("");
            if !file_id.is_empty() {
                return VideoEmbed::DriveFile {
                    file_id: file_id.to_string(),
                    preview_url: format!("https://drive.google.com/file/d/{file_id}/preview"),
                };
            }
        }
    }
    VideoEmbed::External {
        url: link.to_string(),
    }
}
