//! Synchronization pipeline
//!
//! Wire documents come in through the store subscription, get normalized
//! into canonical entries, and land in the [`live::LiveSyncStore`] array
//! every view projection reads from.

pub mod live;
pub mod normalize;

pub use live::{ListenerId, LiveSyncStore};
pub use normalize::{entry_document, normalize};
