//! Position difficulty from the spread of the engine's top three lines.

use dataset::Tier;
use shakmaty::{fen::Fen, Chess, EnPassantMode};
use tracing::warn;

use crate::stockfish::{AnalysisRequest, PositionAnalyzer, PvLine};

/// Lines requested per position.
pub const CANDIDATE_LINES: u32 = 3;

/// Minimum gap in centipawns for each tier, highest first.
pub const TIER_THRESHOLDS: [(i32, Tier); 3] = [(100, Tier::Hard), (50, Tier::Normal), (0, Tier::Easy)];

/// Centipawn scores of the first three lines; mate lines are dropped.
pub fn centipawn_scores(lines: &[PvLine]) -> Vec<i32> {
    lines
        .iter()
        .filter_map(|line| match (line.cp, line.mate) {
            (Some(cp), None) => Some(cp),
            _ => None,
        })
        .take(CANDIDATE_LINES as usize)
        .collect()
}

/// `|best - third| + |best - second|`, or None with fewer than three scores.
pub fn evaluation_gap(scores: &[i32]) -> Option<i32> {
    match scores {
        [best, second, third, ..] => Some((best - third).abs() + (best - second).abs()),
        _ => None,
    }
}

pub fn tier_for_gap(gap: i32) -> Tier {
    TIER_THRESHOLDS
        .iter()
        .find(|(min, _)| gap >= *min)
        .map(|(_, tier)| *tier)
        .unwrap_or(Tier::Skip)
}

pub fn classify_lines(lines: &[PvLine]) -> Tier {
    evaluation_gap(&centipawn_scores(lines))
        .map(tier_for_gap)
        .unwrap_or(Tier::Skip)
}

/// Analyse `pos` and classify it. Analysis failures classify as Skip.
pub async fn classify_position<A: PositionAnalyzer>(
    analyzer: &mut A,
    pos: &Chess,
    request: &AnalysisRequest,
) -> Tier {
    let fen = Fen::from_position(pos, EnPassantMode::Legal).to_string();
    match analyzer.analyse(&fen, request).await {
        Ok(lines) => classify_lines(&lines),
        Err(e) => {
            warn!(fen = %fen, error = %e, "Analysis failed, skipping position");
            Tier::Skip
        }
    }
}
