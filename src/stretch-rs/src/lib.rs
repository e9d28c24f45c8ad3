//! Stretch Client Library
//!
//! HTTP client for a document-search service's REST API, organised as
//! `Server` -> `Index` -> `IndexType` handles.
//!
//! ```rust,no_run
//! use serde_json::json;
//! use stretch_rs::Server;
//!
//! # async fn run() -> stretch_rs::Result<()> {
//! let server = Server::new("http://localhost:9200")?;
//! let tweets = server.index("foo").doc_type("tweet");
//! tweets.put("987", &json!({"message": "hello!"})).await?;
//!
//! let res = server.index("foo").search(&json!({"query": {"match_all": {}}})).await?;
//! println!("{} hits", res.total());
//! # Ok(())
//! # }
//! ```

mod component;
mod index;
mod index_type;
mod server;

pub use index::Index;
pub use index_type::{GetOptions, IndexType};
pub use reqwest::Method;
pub use server::{RequestBody, Server};
pub use stretch_core::{ClientConfig, Document, Params, SearchResults};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("URL cannot be used as a base: {0}")]
    InvalidBaseUrl(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Request(RequestError::NotFound { .. }))
    }

    /// HTTP status of a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request(e) => Some(e.status()),
            _ => None,
        }
    }
}

/// A request the server answered with a non-success status
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{method} {url} not found: {body}")]
    NotFound {
        method: String,
        url: String,
        body: String,
    },

    #[error("{method} {url} failed with HTTP {status}: {body}")]
    Status {
        status: u16,
        method: String,
        url: String,
        body: String,
    },
}

impl RequestError {
    pub fn status(&self) -> u16 {
        match self {
            RequestError::NotFound { .. } => 404,
            RequestError::Status { status, .. } => *status,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            RequestError::NotFound { body, .. } | RequestError::Status { body, .. } => body,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
