//! Storage module
//!
//! Asset-host seam for media files that are uploaded instead of inlined.

pub mod asset_host;

pub use asset_host::{AssetHost, HttpAssetHost, LocalAssetStore};
