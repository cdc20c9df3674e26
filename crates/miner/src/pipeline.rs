//! Select -> mine -> curate -> export, plus dedup of exported files.

use std::path::Path;

use chess_core::board::{describe_position, BoardSnapshot};
use chess_core::game_data::GameData;
use chess_core::game_file::{read_games_file, write_games_file};
use chess_core::selection::select_top_games;
use dataset::export::{ensure_output_dir, export_tier};
use dataset::on_disk::dedup_dataset_dir;
use dataset::{
    assign_ids, dedup, CanonicalRecord, DatasetError, Deduplicated, ExportFormat, ExportReport,
    FileDedupReport, PositionRecord, Tier,
};
use shakmaty::Position;
use tracing::{error, info};

use crate::archive::ChessComClient;
use crate::classifier::classify_position;
use crate::config::MinerConfig;
use crate::error::MinerError;
use crate::replay::{replay_game, turn_label};
use crate::stockfish::{AnalysisRequest, PositionAnalyzer, StockfishEngine};

/// Mined positions per exported tier, in replay order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TierBuckets {
    pub hard: Vec<PositionRecord>,
    pub normal: Vec<PositionRecord>,
    pub easy: Vec<PositionRecord>,
}

impl TierBuckets {
    /// Returns false for Skip, which has no bucket.
    pub fn push(&mut self, tier: Tier, record: PositionRecord) -> bool {
        match tier {
            Tier::Hard => self.hard.push(record),
            Tier::Normal => self.normal.push(record),
            Tier::Easy => self.easy.push(record),
            Tier::Skip => return false,
        }
        true
    }

    pub fn get(&self, tier: Tier) -> &[PositionRecord] {
        match tier {
            Tier::Hard => &self.hard,
            Tier::Normal => &self.normal,
            Tier::Easy => &self.easy,
            Tier::Skip => &[],
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MiningStats {
    pub games: usize,
    pub positions: usize,
    pub skipped: usize,
    pub rejected_moves: usize,
}

/// Replay one game and file every classified position into `buckets`.
pub async fn mine_game<A: PositionAnalyzer>(
    analyzer: &mut A,
    moves: &[String],
    request: &AnalysisRequest,
    buckets: &mut TierBuckets,
    stats: &mut MiningStats,
) {
    let replay = replay_game(moves);
    stats.rejected_moves += replay.rejected.len();

    for step in replay.steps {
        stats.positions += 1;
        let tier = classify_position(analyzer, &step.position, request).await;
        if tier == Tier::Skip {
            stats.skipped += 1;
            continue;
        }

        let board = step.position.board();
        let record = PositionRecord {
            board: BoardSnapshot::from_board(board),
            white_moved: step.white_moved,
            verbal: describe_position(board, turn_label(step.white_moved)),
            move_history: step.move_history,
        };
        buckets.push(tier, record);
    }
    stats.games += 1;
}

/// Mine every game in order with one analyzer.
pub async fn mine_games<A: PositionAnalyzer>(
    analyzer: &mut A,
    games: &[Vec<String>],
    request: &AnalysisRequest,
) -> (TierBuckets, MiningStats) {
    let mut buckets = TierBuckets::default();
    let mut stats = MiningStats::default();

    for (i, moves) in games.iter().enumerate() {
        mine_game(analyzer, moves, request, &mut buckets, &mut stats).await;
        info!(
            game = i + 1,
            total = games.len(),
            hard = buckets.hard.len(),
            normal = buckets.normal.len(),
            easy = buckets.easy.len(),
            skipped = stats.skipped,
            rejected_moves = stats.rejected_moves,
            "Game mined"
        );
    }

    (buckets, stats)
}

/// Normalize, deduplicate and number one tier's records.
pub fn curate(records: &[PositionRecord]) -> Deduplicated<CanonicalRecord> {
    let unique = dedup(records.iter().map(PositionRecord::normalized));
    Deduplicated {
        records: assign_ids(unique.records),
        removed: unique.removed,
    }
}

/// Curate and write every tier in every format. Only a missing output
/// directory is fatal; view failures are collected in the report.
pub fn export_all(
    dir: &Path,
    buckets: &TierBuckets,
    formats: &[ExportFormat],
) -> Result<ExportReport, MinerError> {
    ensure_output_dir(dir)?;
    let mut report = ExportReport::default();

    for tier in Tier::EXPORTED {
        let curated = curate(buckets.get(tier));
        info!(
            tier = %tier,
            records = curated.records.len(),
            duplicates_removed = curated.removed,
            "Tier curated"
        );
        for &format in formats {
            export_tier(dir, tier, &curated.records, format, &mut report);
        }
    }

    Ok(report)
}

/// Fetch the subject's archive, keep the best games and write the games file.
pub async fn run_selection(config: &MinerConfig) -> Result<Vec<GameData>, MinerError> {
    let client = ChessComClient::new(config.archive_delay)?;
    let pool = client.fetch_all_games(&config.username).await?;
    let pool_size = pool.len();

    let selected = select_top_games(pool, &config.username, config.top_games);
    write_games_file(&config.games_file, &selected)?;

    info!(
        pool = pool_size,
        selected = selected.len(),
        path = %config.games_file.display(),
        "Games selected"
    );
    Ok(selected)
}

/// Mine the games file with Stockfish and export the datasets.
pub async fn run_mining(config: &MinerConfig) -> Result<ExportReport, MinerError> {
    let games = read_games_file(&config.games_file)?;
    info!(games = games.len(), path = %config.games_file.display(), "Games loaded");

    let mut engine = StockfishEngine::new(&config.stockfish_path, &config.engine_options()).await?;
    info!(path = %config.stockfish_path, "Stockfish engine ready");

    let request = config.analysis_request();
    let (buckets, stats) = mine_games(&mut engine, &games, &request).await;
    engine.quit().await;

    info!(
        games = stats.games,
        positions = stats.positions,
        skipped = stats.skipped,
        rejected_moves = stats.rejected_moves,
        "Mining complete"
    );

    export_all(&config.output_dir, &buckets, &config.output_format.formats())
}

/// Deduplicate the exported files of every configured format.
pub fn run_dedup(config: &MinerConfig) -> Vec<Result<FileDedupReport, DatasetError>> {
    let mut results = Vec::new();
    for format in config.output_format.formats() {
        results.extend(dedup_dataset_dir(&config.output_dir, format, config.dedup_target));
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    let removed: usize = results.iter().flatten().map(|r| r.removed).sum();
    if failed > 0 {
        error!(failed, removed, "Dataset dedup finished with errors");
    } else {
        info!(removed, "Dataset dedup finished");
    }
    results
}
