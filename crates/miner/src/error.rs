//! Miner error types

use std::time::Duration;

use dataset::DatasetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
