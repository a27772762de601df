//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Media Limits =====

/// Hard cap on any media file accepted for ingestion, before compression.
/// Files above this are rejected outright rather than compressed.
pub const MAX_MEDIA_FILE_BYTES: usize = 5 * 1024 * 1024;

/// Ceiling for an inline (data-URL) payload stored inside an entry document.
/// The document store rejects larger documents, so audio clips and encoded
/// images must fit under this before a write is attempted.
pub const MAX_INLINE_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Size budget an encoded image must reach after compression.
pub const IMAGE_TARGET_BYTES: usize = 800 * 1024;

/// Images wider than this are scaled down (aspect ratio preserved)
/// before re-encoding.
pub const IMAGE_MAX_WIDTH_PX: u32 = 800;

/// Descending JPEG quality ladder tried during compression. When the last
/// step still misses [`IMAGE_TARGET_BYTES`] the ingestion fails instead of
/// degrading further.
pub const JPEG_QUALITY_STEPS: &[u8] = &[70, 60, 50, 40, 30];

// ===== Video Links =====

/// Hosts an entry's video link may point at. Matching is manual string
/// parsing (scheme and `www.` prefixes stripped first) instead of regex,
/// to avoid adding the `regex` crate dependency.
pub const ALLOWED_VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "drive.google.com"];

// ===== Trash =====

/// Days a soft-deleted entry remains restorable. The trash view displays a
/// countdown from this; only the opt-in purge sweep acts on it.
pub const TRASH_RETENTION_DAYS: i64 = 30;

/// Cron expression for the opt-in trash purge sweep (daily, off-peak).
pub const TRASH_SWEEP_CRON: &str = "0 0 3 * * *";

// ===== Subscription =====

/// Attempts for the initial subscription bootstrap. This is the only place
/// the core retries; user-initiated mutations are single-shot.
pub const SUBSCRIBE_RETRY_ATTEMPTS: u32 = 3;

/// Base backoff between bootstrap attempts, multiplied by the attempt number.
pub const SUBSCRIBE_RETRY_BASE_MS: u64 = 500;

/// Poll interval of the HTTP document-store client's change detection.
pub const STORE_POLL_INTERVAL_MS: u64 = 2_000;
