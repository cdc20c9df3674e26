//! Position miner CLI
//!
//! Selects a player's strongest-opposition games from chess.com, mines every
//! position with Stockfish and writes deduplicated tiered datasets.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dataset::DedupTarget;
use tracing::{error, info};

use position_miner::config::{MinerConfig, OutputFormat};
use position_miner::pipeline::{run_dedup, run_mining, run_selection};

#[derive(Parser, Debug)]
#[command(name = "position-miner", version, about)]
struct Cli {
    /// Dataset directory (overrides OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// jsonl, txt or both (overrides OUTPUT_FORMAT)
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    /// Games file path (overrides GAMES_FILE)
    #[arg(long, global = true)]
    games_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the archive and write the games file
    Select {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        top: Option<usize>,
    },
    /// Mine the games file and export datasets
    Mine {
        #[arg(long)]
        stockfish: Option<String>,
        #[arg(long)]
        movetime_ms: Option<u64>,
    },
    /// Remove duplicate entries from exported datasets
    Dedup {
        /// Write `_clean` copies instead of rewriting in place
        #[arg(long)]
        clean_copy: bool,
    },
    /// select, mine and dedup in one go
    Run,
}

impl Cli {
    fn apply(&self, config: &mut MinerConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(path) = &self.games_file {
            config.games_file = path.clone();
        }

        match &self.command {
            Command::Select { username, top } => {
                if let Some(username) = username {
                    config.username = username.clone();
                }
                if let Some(top) = top {
                    config.top_games = *top;
                }
            }
            Command::Mine { stockfish, movetime_ms } => {
                if let Some(path) = stockfish {
                    config.stockfish_path = path.clone();
                }
                if let Some(ms) = movetime_ms {
                    config.movetime = std::time::Duration::from_millis(*ms);
                }
            }
            Command::Dedup { clean_copy } => {
                if *clean_copy {
                    config.dedup_target = DedupTarget::CleanCopy;
                }
            }
            Command::Run => {}
        }
    }
}

async fn mine(config: &MinerConfig) -> anyhow::Result<()> {
    let report = run_mining(config).await.context("Mining failed")?;
    info!(written = report.written.len(), failed = report.failed.len(), "Datasets exported");
    if !report.is_complete() {
        anyhow::bail!("{} dataset files could not be written", report.failed.len());
    }
    Ok(())
}

fn dedup(config: &MinerConfig) -> anyhow::Result<()> {
    let failed = run_dedup(config).iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{failed} dataset files could not be deduplicated");
    }
    Ok(())
}

/// Both stage outcomes; a failure in either fails the whole run.
fn combine(mined: anyhow::Result<()>, deduped: anyhow::Result<()>) -> anyhow::Result<()> {
    match (mined, deduped) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(mined), Err(deduped)) => Err(mined.context(format!("{deduped:#}"))),
    }
}

async fn run_all(config: &MinerConfig) -> anyhow::Result<()> {
    run_selection(config)
        .await
        .context("Game selection failed")?;
    let mined = mine(config).await;
    if let Err(ref e) = mined {
        error!(error = %format!("{e:#}"), "Mining failed, deduplicating existing datasets anyway");
    }
    // Dedup whatever is on disk even when some views failed to write
    combine(mined, dedup(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = MinerConfig::load()?;
    cli.apply(&mut config);
    config.validate()?;

    let result = match cli.command {
        Command::Select { .. } => run_selection(&config)
            .await
            .map(|_| ())
            .context("Game selection failed"),
        Command::Mine { .. } => mine(&config).await,
        Command::Dedup { .. } => dedup(&config),
        Command::Run => run_all(&config).await,
    };

    if let Err(ref e) = result {
        error!(error = %format!("{e:#}"), "Run failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_keeps_every_failure() {
        assert!(combine(Ok(()), Ok(())).is_ok());

        let mined = combine(Err(anyhow::anyhow!("2 dataset files could not be written")), Ok(()));
        assert_eq!(mined.unwrap_err().to_string(), "2 dataset files could not be written");

        let deduped = combine(Ok(()), Err(anyhow::anyhow!("1 dataset files could not be deduplicated")));
        assert!(deduped.is_err());

        let both = combine(
            Err(anyhow::anyhow!("write failed")),
            Err(anyhow::anyhow!("dedup failed")),
        )
        .unwrap_err();
        let rendered = format!("{both:#}");
        assert!(rendered.contains("write failed"));
        assert!(rendered.contains("dedup failed"));
    }
}
