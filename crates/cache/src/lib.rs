#![warn(clippy::unwrap_used)]

pub mod client;
pub mod entry;
pub mod local;
pub mod store;

pub use client::ResultCache;
pub use entry::{cache_key, range_key, CacheEntry};
pub use local::LocalCache;
pub use store::FileStore;
