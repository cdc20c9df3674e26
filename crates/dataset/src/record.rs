//! Position records in their mined, normalized and exported forms.

use chess_core::board::BoardSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dedup::DedupKey;
use crate::normalize::normalize;

/// A classified position as produced by replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    pub board: BoardSnapshot,
    /// Turn flag: true when White made the move leading here.
    pub white_moved: bool,
    /// SAN moves from the start up to and including this ply.
    pub move_history: Vec<String>,
    pub verbal: String,
}

impl PositionRecord {
    /// The 4-field untyped shape `(board, turn, history, verbal)`.
    pub fn to_value(&self) -> Value {
        json!([self.board.rows(), self.white_moved, self.move_history, self.verbal])
    }

    pub fn normalized(&self) -> NormalizedRecord {
        normalize(&self.to_value())
    }
}

/// Output of the normalizer. Every field is rendered text; absent data is "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub position: String,
    pub board: String,
    pub turn: String,
    pub move_history: String,
    pub verbal: String,
}

impl DedupKey for NormalizedRecord {
    fn dedup_key(&self) -> &str {
        &self.move_history
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub pos_id: usize,
    pub position: String,
    pub turn: String,
    pub board: String,
    pub move_history: String,
    /// Same value as `move_history`; every exported view carries it.
    pub move_history_copy: String,
    pub verbal: String,
}

impl CanonicalRecord {
    pub fn from_normalized(pos_id: usize, rec: NormalizedRecord) -> Self {
        Self {
            pos_id,
            position: rec.position,
            turn: rec.turn,
            board: rec.board,
            move_history_copy: rec.move_history.clone(),
            move_history: rec.move_history,
            verbal: rec.verbal,
        }
    }
}

/// Number records 1..=n in their current order.
pub fn assign_ids(records: Vec<NormalizedRecord>) -> Vec<CanonicalRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| CanonicalRecord::from_normalized(i + 1, rec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Chess, Position};

    fn record_after_e4() -> PositionRecord {
        let pos = Chess::default();
        PositionRecord {
            board: BoardSnapshot::from_board(pos.board()),
            white_moved: true,
            move_history: vec!["e4".to_string()],
            verbal: "desc".to_string(),
        }
    }

    #[test]
    fn test_position_record_normalizes_through_four_field_shape() {
        let rec = record_after_e4();
        let n = rec.normalized();
        assert_eq!(n.position, "");
        assert_eq!(n.turn, "true");
        assert_eq!(n.move_history, "e4");
        assert_eq!(n.verbal, "desc");
        assert_eq!(n.board, rec.board.to_string());
    }

    #[test]
    fn test_assign_ids_copies_history() {
        let records = vec![
            NormalizedRecord { move_history: "e4".into(), ..Default::default() },
            NormalizedRecord { move_history: "d4".into(), ..Default::default() },
        ];
        let canon = assign_ids(records);
        assert_eq!(canon[0].pos_id, 1);
        assert_eq!(canon[1].pos_id, 2);
        assert_eq!(canon[1].move_history_copy, "d4");
        assert_eq!(canon[1].move_history, "d4");
    }
}
