use pulse_core::{Channel, RecordKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("{channel} {kind:?} source has no column {column}")]
    MissingSourceColumn {
        channel: Channel,
        kind: RecordKind,
        column: String,
    },

    #[error("invalid {channel} {kind:?} column map: {reason}")]
    MapShape {
        channel: Channel,
        kind: RecordKind,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to list {path}: {source}")]
    ListDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output write failed: {0}")]
    Write(#[from] pulse_core::BatchError),
}
