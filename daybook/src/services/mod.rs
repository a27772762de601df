//! Services module
//!
//! Business logic that sits between the action surface and the document
//! store.

pub mod gateway;
pub mod media;
pub mod purge;

pub use gateway::{CreateReceipt, MutationGateway};
pub use purge::PurgeService;
