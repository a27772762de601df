//! Integration tests for the journal core
//!
//! These tests verify end-to-end functionality including:
//! - The create → snapshot → rebuild → projection pipeline
//! - Trash and restore workflows
//! - Media ingestion feeding the mutation gateway

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use daybook::app::JournalApp;
use daybook::auth::FixedAuth;
use daybook::error::AppError;
use daybook::model::{EntryDraft, EntryPatch, MediaKind, MediaPayload};
use daybook::services::media;
use daybook::storage::{AssetHost, LocalAssetStore};
use daybook::store::{DocumentStore, MemoryStore};
use daybook::views::{ListControls, SortOrder};
use tempfile::TempDir;

async fn start_app(store: Arc<MemoryStore>) -> Result<JournalApp> {
    daybook::app::init_tracing();
    let auth = Arc::new(FixedAuth::signed_in("owner-1"));
    let app = JournalApp::start(auth, store as Arc<dyn DocumentStore>).await?;
    Ok(app)
}

fn draft(title: &str, content: &str) -> EntryDraft {
    EntryDraft {
        title: title.to_string(),
        content: content.to_string(),
        ..Default::default()
    }
}

/// Wait until the sync store's rebuilt array satisfies a predicate. The
/// UI contract is exactly this: a mutation has no visible effect until
/// the next snapshot lands.
async fn wait_for(app: &JournalApp, predicate: impl Fn(&JournalApp) -> bool) -> Result<()> {
    for _ in 0..100 {
        if predicate(app) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    anyhow::bail!("condition not reached before timeout")
}

#[tokio::test]
async fn test_create_flows_through_snapshot_into_views() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = start_app(store).await?;

    let receipt = app
        .gateway()
        .create(EntryDraft {
            tags: vec!["#first".to_string()],
            video_link: Some("https://youtu.be/abc123".to_string()),
            ..draft("First entry", "Hello journal")
        })
        .await?;
    assert!(!receipt.media_dropped);

    wait_for(&app, |app| !app.sync().snapshot().is_empty()).await?;

    let cards = app.list(&ListControls::default());
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, receipt.id);
    assert_eq!(cards[0].title, "First entry");
    assert_eq!(cards[0].tags, vec!["#first"]);
    assert!(cards[0].video.is_some());

    // Nothing in the trash yet.
    assert!(app.trash().is_empty());

    app.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_views_rerender_from_rebuilt_array() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = start_app(store).await?;

    for (title, content) in [("One", "a"), ("Two", "b"), ("Three", "c")] {
        app.gateway().create(draft(title, content)).await?;
    }
    wait_for(&app, |app| app.sync().snapshot().len() == 3).await?;

    let newest = app.list(&ListControls::default());
    assert_eq!(newest[0].title, "Three");

    let oldest = app.list(&ListControls {
        sort: SortOrder::Oldest,
        ..Default::default()
    });
    assert_eq!(oldest[0].title, "One");

    let searched = app.list(&ListControls {
        search: Some("two".to_string()),
        ..Default::default()
    });
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].title, "Two");

    Ok(())
}

#[tokio::test]
async fn test_trash_restore_and_delete_forever_workflow() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = start_app(store).await?;

    let receipt = app.gateway().create(draft("Ephemeral", "soon gone")).await?;
    wait_for(&app, |app| app.sync().snapshot().len() == 1).await?;

    app.gateway().move_to_trash(&receipt.id).await?;
    wait_for(&app, |app| app.sync().snapshot()[0].deleted).await?;

    assert!(app.list(&ListControls::default()).is_empty());
    let trash = app.trash();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].days_left, 30);

    app.gateway().restore_from_trash(&receipt.id).await?;
    wait_for(&app, |app| !app.sync().snapshot()[0].deleted).await?;

    let restored = &app.sync().snapshot()[0];
    assert!(restored.deleted_date.is_none());
    assert_eq!(app.list(&ListControls::default()).len(), 1);
    assert!(app.trash().is_empty());

    app.gateway().move_to_trash(&receipt.id).await?;
    app.gateway().delete_forever(&receipt.id).await?;
    wait_for(&app, |app| app.sync().snapshot().is_empty()).await?;

    Ok(())
}

#[tokio::test]
async fn test_update_merges_fields_and_advances_last_modified() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = start_app(store).await?;

    let receipt = app.gateway().create(draft("Original", "text")).await?;
    wait_for(&app, |app| app.sync().snapshot().len() == 1).await?;
    let before = app.sync().snapshot()[0].clone();

    tokio::time::sleep(Duration::from_millis(5)).await;
    app.gateway()
        .update(
            &receipt.id,
            EntryPatch {
                title: Some("Edited".to_string()),
                tags: Some(vec!["#edited".to_string()]),
                ..Default::default()
            },
        )
        .await?;
    wait_for(&app, |app| app.sync().snapshot()[0].title == "Edited").await?;

    let after = app.sync().snapshot()[0].clone();
    assert_eq!(after.date, before.date);
    assert!(after.last_modified > before.last_modified);
    assert_eq!(after.content, "text");
    assert_eq!(after.tags, vec!["#edited"]);

    Ok(())
}

#[tokio::test]
async fn test_ingested_media_rides_along_with_create() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = start_app(store).await?;

    let attachment = media::ingest_audio("audio/mpeg", &[1u8; 4096])?;
    app.gateway()
        .create(EntryDraft {
            media: Some(attachment),
            ..draft("With audio", "listen")
        })
        .await?;

    wait_for(&app, |app| !app.sync().snapshot().is_empty()).await?;

    let entry = &app.sync().snapshot()[0];
    let media = entry.media.as_ref().expect("attachment survived sync");
    assert_eq!(media.kind, MediaKind::Audio);
    assert!(matches!(
        &media.payload,
        MediaPayload::Inline(data) if data.starts_with("data:audio/mpeg;base64,")
    ));

    Ok(())
}

#[tokio::test]
async fn test_uploaded_media_stored_as_url_attachment() -> Result<()> {
    let temp = TempDir::new()?;
    let assets = LocalAssetStore::new(temp.path().join("assets"));
    assets.initialize().await?;

    let store = Arc::new(MemoryStore::new());
    let app = start_app(store).await?;

    let attachment = media::upload_media(
        &assets as &dyn AssetHost,
        MediaKind::Image,
        "photo.jpg",
        "image/jpeg",
        b"jpeg-bytes",
    )
    .await?;

    app.gateway()
        .create(EntryDraft {
            media: Some(attachment),
            ..draft("With photo", "look")
        })
        .await?;
    wait_for(&app, |app| !app.sync().snapshot().is_empty()).await?;

    let entry = &app.sync().snapshot()[0];
    let media = entry.media.as_ref().expect("attachment survived sync");
    assert!(matches!(
        &media.payload,
        MediaPayload::Url(url) if url.contains("/images/") && url.ends_with("_photo.jpg")
    ));

    Ok(())
}

#[tokio::test]
async fn test_mutations_require_authentication() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let auth = Arc::new(FixedAuth::anonymous());
    let result = JournalApp::start(auth, store as Arc<dyn DocumentStore>).await;

    assert!(matches!(result, Err(AppError::Unauthenticated)));
    Ok(())
}

#[tokio::test]
async fn test_purge_sweep_respects_retention_window() -> Result<()> {
    use chrono::Duration as ChronoDuration;
    use daybook::store::{DocTimestamp, EntryDocument};

    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();

    let expired = EntryDocument {
        title: "forgotten".to_string(),
        content: "c".to_string(),
        date: Some(DocTimestamp::from_utc(now - ChronoDuration::days(50))),
        deleted: true,
        deleted_date: Some(DocTimestamp::from_utc(now - ChronoDuration::days(31))),
        ..Default::default()
    };
    store.seed("owner-1", expired);

    let app = start_app(Arc::clone(&store)).await?;
    let receipt = app.gateway().create(draft("Fresh", "keep me")).await?;
    app.gateway().move_to_trash(&receipt.id).await?;

    let removed =
        daybook::services::purge::sweep_expired(store.as_ref(), "owner-1", Utc::now()).await?;
    assert_eq!(removed, 1);

    wait_for(&app, |app| app.sync().snapshot().len() == 1).await?;
    assert_eq!(app.sync().snapshot()[0].id, receipt.id);

    Ok(())
}
