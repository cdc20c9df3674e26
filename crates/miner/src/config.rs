//! Miner configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dataset::{DedupTarget, ExportFormat};
use tracing::info;

use crate::error::MinerError;
use crate::stockfish::{AnalysisRequest, EngineOptions};

/// Which dataset formats a run writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jsonl,
    Txt,
    Both,
}

impl OutputFormat {
    pub fn formats(self) -> Vec<ExportFormat> {
        match self {
            OutputFormat::Jsonl => vec![ExportFormat::Jsonl],
            OutputFormat::Txt => vec![ExportFormat::Txt],
            OutputFormat::Both => vec![ExportFormat::Jsonl, ExportFormat::Txt],
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "both" => Ok(OutputFormat::Both),
            other => match other.parse::<ExportFormat>()? {
                ExportFormat::Jsonl => Ok(OutputFormat::Jsonl),
                ExportFormat::Txt => Ok(OutputFormat::Txt),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct MinerConfig {
    /// Player whose archive is mined; opponent ratings are relative to them
    pub username: String,

    /// Number of source games to keep
    pub top_games: usize,

    /// Pause between archive requests
    pub archive_delay: Duration,

    /// Selected games, one `game` block each
    pub games_file: PathBuf,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    pub engine_threads: u32,
    pub engine_hash_mb: u32,

    /// Search time per position
    pub movetime: Duration,

    /// Extra wait past `movetime` before a search counts as timed out
    pub analysis_grace: Duration,

    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub dedup_target: DedupTarget,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            username: "magnuscarlsen".to_string(),
            top_games: 10,
            archive_delay: Duration::from_millis(1000),
            games_file: PathBuf::from("formatted_games.txt"),
            stockfish_path: "stockfish".to_string(),
            engine_threads: 1,
            engine_hash_mb: 256,
            movetime: Duration::from_millis(100),
            analysis_grace: Duration::from_millis(2000),
            output_dir: PathBuf::from("data"),
            output_format: OutputFormat::Jsonl,
            dedup_target: DedupTarget::InPlace,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl MinerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn load() -> Result<Self, MinerError> {
        let defaults = Self::default();

        let output_format = match env::var("OUTPUT_FORMAT") {
            Ok(v) => v.parse().map_err(MinerError::Config)?,
            Err(_) => defaults.output_format,
        };

        let dedup_target = if env_or("DEDUP_IN_PLACE", true) {
            DedupTarget::InPlace
        } else {
            DedupTarget::CleanCopy
        };

        let config = Self {
            username: env::var("CHESS_USERNAME").unwrap_or(defaults.username),
            top_games: env_or("TOP_GAMES", defaults.top_games),
            archive_delay: Duration::from_millis(env_or("ARCHIVE_DELAY_MS", 1000)),
            games_file: env::var("GAMES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.games_file),
            stockfish_path: env::var("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            engine_threads: env_or("ENGINE_THREADS", defaults.engine_threads),
            engine_hash_mb: env_or("ENGINE_HASH_MB", defaults.engine_hash_mb),
            movetime: Duration::from_millis(env_or("ANALYSIS_MOVETIME_MS", 100)),
            analysis_grace: Duration::from_millis(env_or("ANALYSIS_GRACE_MS", 2000)),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            output_format,
            dedup_target,
        };

        config.validate()?;
        info!(
            username = %config.username,
            top_games = config.top_games,
            output_dir = %config.output_dir.display(),
            "Config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MinerError> {
        if self.username.trim().is_empty() {
            return Err(MinerError::Config("CHESS_USERNAME is empty".into()));
        }
        if self.movetime.is_zero() {
            return Err(MinerError::Config("ANALYSIS_MOVETIME_MS must be positive".into()));
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            threads: self.engine_threads,
            hash_mb: self.engine_hash_mb,
        }
    }

    pub fn analysis_request(&self) -> AnalysisRequest {
        AnalysisRequest {
            multipv: crate::classifier::CANDIDATE_LINES,
            movetime: self.movetime,
            grace: self.analysis_grace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("both".parse::<OutputFormat>(), Ok(OutputFormat::Both));
        assert_eq!("TXT".parse::<OutputFormat>(), Ok(OutputFormat::Txt));
        assert_eq!("jsonl".parse::<OutputFormat>(), Ok(OutputFormat::Jsonl));
        assert!("csv".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Both.formats().len(), 2);
    }

    #[test]
    fn test_validate_rejects_zero_movetime() {
        let config = MinerConfig {
            movetime: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MinerError::Config(_))));
        assert!(MinerConfig::default().validate().is_ok());
    }
}
