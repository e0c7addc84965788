//! Threads Graph API client and the post sync job.

pub mod client;
pub mod error;
pub mod sync;
pub mod types;

pub use client::ThreadsClient;
pub use error::ThreadsError;
pub use sync::{sync_posts, SyncError, SyncReport};
pub use types::MediaItem;
