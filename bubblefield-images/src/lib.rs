//! Avatar image loading for the bubble field.
//!
//! [`ImageCache`] deduplicates and rate-limits fetches and remembers decoded images for the
//! session. [`HttpFetcher`] downloads remote avatars and resolves local ones through
//! [`LocalFetcher`]. [`AvatarLoader`] runs the cache on a tokio runtime and hands results back to
//! the single-threaded simulation through the [`bubblefield_core::ImageSource`] seam.

use bytes::Bytes;
use futures::future::BoxFuture;
use thiserror::Error;

mod cache;
mod fetch;
mod loader;

pub use cache::ImageCache;
pub use fetch::{normalize_avatar_url, HttpFetcher, LocalFetcher};
pub use loader::AvatarLoader;

// --- Error Type ---

/// Why an image could not be produced. `Clone` so one failure can be shared by every
/// caller waiting on the same URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Timed out loading {url} after {millis} ms")]
    Timeout { url: String, millis: u64 },

    #[error("Unsupported image URL: {0}")]
    UnsupportedUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to start image runtime: {0}")]
    Runtime(String),

    #[error("Image loader is shut down")]
    Closed,
}

// --- Traits ---

/// Retrieves the raw bytes behind an image URL.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Bytes, ImageError>>;
}
