//! Media ingestion
//!
//! Turns a user-picked file into the single attachment an entry may carry:
//! either an inline data-URL payload small enough for the document store,
//! or an upload to the asset host exchanged for a URL. Images are resized
//! and re-encoded down a bounded quality ladder; audio is never compressed
//! and must fit the inline ceiling as-is.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::config;
use crate::error::{AppError, Result};
use crate::model::{MediaAttachment, MediaKind, MediaPayload};
use crate::storage::AssetHost;

/// Validate and compress an image file into an inline attachment.
///
/// The raw size check happens before any decoding, so an oversize file is
/// rejected without paying for decompression.
pub fn ingest_image(bytes: &[u8]) -> Result<MediaAttachment> {
    check_hard_cap(bytes.len())?;

    image::guess_format(bytes)
        .map_err(|_| AppError::InvalidInput("Unrecognized image format".to_string()))?;
    let img = image::load_from_memory(bytes)
        .map_err(|err| AppError::InvalidInput(format!("Could not decode image: {err}")))?;

    let img = if img.width() > config::IMAGE_MAX_WIDTH_PX {
        let scale = config::IMAGE_MAX_WIDTH_PX as f32 / img.width() as f32;
        let height = ((img.height() as f32 * scale).round() as u32).max(1);
        tracing::debug!(
            "Scaling image from {}x{} to {}x{}",
            img.width(),
            img.height(),
            config::IMAGE_MAX_WIDTH_PX,
            height
        );
        img.resize_exact(config::IMAGE_MAX_WIDTH_PX, height, FilterType::Triangle)
    } else {
        img
    };
    let rgb = img.to_rgb8();

    for &quality in config::JPEG_QUALITY_STEPS {
        let mut encoded = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
        encoder
            .encode_image(&rgb)
            .map_err(|err| AppError::InvalidInput(format!("Could not encode image: {err}")))?;

        if encoded.len() <= config::IMAGE_TARGET_BYTES {
            tracing::debug!(
                "Image compressed to {} KB at quality {}",
                encoded.len() / 1024,
                quality
            );
            return Ok(MediaAttachment {
                kind: MediaKind::Image,
                payload: MediaPayload::Inline(format!(
                    "data:image/jpeg;base64,{}",
                    BASE64.encode(&encoded)
                )),
            });
        }
    }

    Err(AppError::CompressionFailed {
        attempts: config::JPEG_QUALITY_STEPS.len(),
    })
}

/// Validate an audio file into an inline attachment. Audio is stored
/// as-is, so besides the hard cap it must fit the smaller inline-document
/// ceiling.
pub fn ingest_audio(mime_type: &str, bytes: &[u8]) -> Result<MediaAttachment> {
    check_hard_cap(bytes.len())?;

    if !mime_type.starts_with("audio/") {
        return Err(AppError::InvalidInput(format!(
            "Not an audio file: {mime_type}"
        )));
    }
    if bytes.len() > config::MAX_INLINE_PAYLOAD_BYTES {
        return Err(AppError::PayloadTooLarge {
            size: bytes.len(),
            limit: config::MAX_INLINE_PAYLOAD_BYTES,
        });
    }

    Ok(MediaAttachment {
        kind: MediaKind::Audio,
        payload: MediaPayload::Inline(format!(
            "data:{mime_type};base64,{}",
            BASE64.encode(bytes)
        )),
    })
}

/// Upload a media file to the asset host instead of inlining it, producing
/// a URL-bearing attachment. Paths follow the host convention
/// `{images|audio}/{timestamp}_{filename}`.
pub async fn upload_media(
    host: &dyn AssetHost,
    kind: MediaKind,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<MediaAttachment> {
    check_hard_cap(bytes.len())?;

    let directory = match kind {
        MediaKind::Image => "images",
        MediaKind::Audio => "audio",
    };
    let path = format!(
        "{}/{}_{}",
        directory,
        Utc::now().timestamp_millis(),
        sanitize_filename(filename)
    );

    tracing::info!("Uploading media to asset host: {}", path);
    let url = host.upload(&path, content_type, bytes).await?;

    Ok(MediaAttachment {
        kind,
        payload: MediaPayload::Url(url),
    })
}

fn check_hard_cap(size: usize) -> Result<()> {
    if size > config::MAX_MEDIA_FILE_BYTES {
        return Err(AppError::PayloadTooLarge {
            size,
            limit: config::MAX_MEDIA_FILE_BYTES,
        });
    }
    Ok(())
}

/// Sanitize filename to prevent path traversal on the asset host
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && *c != '\0')
        .take(255)
        .collect()
}
