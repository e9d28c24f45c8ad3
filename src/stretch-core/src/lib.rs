//! Stretch Core Library
//!
//! Transport-free building blocks for the stretch search client:
//! - Client configuration
//! - Query-string parameters
//! - Search result normalization
//! - Bulk and multi-search request bodies

pub mod bulk;
pub mod config;
pub mod params;
pub mod search;

// Re-export commonly used types
pub use config::ClientConfig;
pub use params::{qurl, Params};
pub use search::{Document, SearchResults};
