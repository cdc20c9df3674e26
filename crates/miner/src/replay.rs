//! Move-by-move replay of a game's SAN list from the standard start.

use shakmaty::{san::SanPlus, Chess, Position};
use tracing::debug;

/// Why a move could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    Unparsable,
    Illegal,
}

/// Apply one SAN move. On rejection `pos` is what the caller keeps.
pub fn try_apply(pos: &Chess, san: &str) -> Result<Chess, MoveRejection> {
    let san_plus = san
        .parse::<SanPlus>()
        .map_err(|_| MoveRejection::Unparsable)?;
    let mv = san_plus
        .san
        .to_move(pos)
        .map_err(|_| MoveRejection::Illegal)?;

    let mut next = pos.clone();
    next.play_unchecked(mv);
    Ok(next)
}

/// The position after one applied move.
#[derive(Debug, Clone)]
pub struct ReplayStep {
    pub position: Chess,
    pub move_history: Vec<String>,
    /// True when White made this move.
    pub white_moved: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Replay {
    pub steps: Vec<ReplayStep>,
    /// Moves that were skipped, with their index in the input.
    pub rejected: Vec<(usize, MoveRejection)>,
}

pub fn turn_label(white_moved: bool) -> &'static str {
    if white_moved {
        "true"
    } else {
        "false"
    }
}

/// Replay `moves`, yielding one step per applied move. Rejected moves leave
/// the board, history and turn flag untouched.
pub fn replay_game(moves: &[String]) -> Replay {
    let mut pos = Chess::default();
    let mut history: Vec<String> = Vec::with_capacity(moves.len());
    let mut white_moved = true;
    let mut replay = Replay::default();

    for (i, san) in moves.iter().enumerate() {
        match try_apply(&pos, san) {
            Ok(next) => {
                pos = next;
                history.push(san.clone());
                replay.steps.push(ReplayStep {
                    position: pos.clone(),
                    move_history: history.clone(),
                    white_moved,
                });
                white_moved = !white_moved;
            }
            Err(reason) => {
                debug!(ply = i + 1, san = %san, ?reason, "Skipping move");
                replay.rejected.push((i, reason));
            }
        }
    }

    replay
}
