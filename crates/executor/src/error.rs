use thiserror::Error;

use common::error::Error as ArbGraphError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Encountered unexpected line {line} in input file: {reason}")]
    Parse { line: u64, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Rate file could not be read: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    ConfigLoadError(String),

    #[error("Channel sender failed: Receiver has been dropped.")]
    ChannelSendFailed,

    #[error("{0}")]
    GraphError(#[from] ArbGraphError),

    #[error("Pipeline task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
