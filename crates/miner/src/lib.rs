//! Position miner: selects source games, replays them against a UCI engine
//! and curates the classified positions into datasets.

pub mod archive;
pub mod classifier;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod replay;
pub mod stockfish;

pub use config::{MinerConfig, OutputFormat};
pub use error::MinerError;
pub use stockfish::{AnalysisRequest, PositionAnalyzer, PvLine, StockfishEngine};
