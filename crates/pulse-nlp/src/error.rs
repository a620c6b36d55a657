use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("rate limited by NLP service (status {status})")]
    RateLimited { status: u16 },

    #[error("token pool {pool} exhausted: every credential was rate limited")]
    PoolExhausted { pool: String },

    #[error("token pool {0} has no credentials")]
    EmptyPool(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no text column {column}")]
    MissingTextColumn { path: String, column: String },

    #[error("failed to list {path}: {source}")]
    ListDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output write failed: {0}")]
    Write(#[from] pulse_core::BatchError),
}
