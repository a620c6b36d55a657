use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("pagination limit reached for {feed}: exceeded {max_pages} pages")]
    PaginationLimit { feed: String, max_pages: usize },

    #[error("missing credential {var} required for {channel}")]
    MissingCredential { channel: String, var: String },

    #[error("unexpected response shape from {url}: {reason}")]
    Shape { url: String, reason: String },

    #[error("output write failed: {0}")]
    Write(#[from] pulse_core::BatchError),
}
