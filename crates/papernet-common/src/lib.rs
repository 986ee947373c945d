//! papernet-common — Shared error type and HTTP client used across all Papernet crates.

pub mod error;
pub mod http;

// Re-export commonly used types
pub use error::{PapernetError, Result};
pub use http::ScopedClient;
