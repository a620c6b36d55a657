pub mod app_config;
pub mod batch;
pub mod channel;
pub mod config;
pub mod schema;
pub mod sources;
pub mod timefmt;

pub use app_config::AppConfig;
pub use batch::{nlp_sibling, BatchError, BatchWriter, WriteSummary, DEFAULT_BATCH_SIZE};
pub use channel::{parse_file_name, Channel, RecordKind, UnknownChannel};
pub use config::{load_app_config, load_app_config_from_env};
pub use schema::{CanonicalRow, Cell, COMMENT_FIELDS, ENRICHMENT_FIELDS, POST_FIELDS};
pub use sources::{
    load_sources, FacebookSource, Granularity, InstagramSource, LinkedInSource, SourcesFile, TwitterSource,
    WeiboSource,
};
pub use timefmt::{format_local, TIMESTAMP_FORMAT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("sources validation failed: {0}")]
    Validation(String),
}
