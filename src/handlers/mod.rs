//! Business logic handlers
//!
//! These handlers contain the request logic shared by the HTTP server and
//! the one-shot function invocation.

pub mod sessions;

// Re-export commonly used types
pub use sessions::*;
