//! Board snapshots and plain-English position descriptions.

use serde::{Deserialize, Serialize};
use shakmaty::{Board, Color, File, Piece, Rank, Role, Square};

/// Marker used for unoccupied squares in a snapshot.
pub const EMPTY_SQUARE: char = '.';

/// 8x8 grid of cell labels. Row 0 is rank 8, column 0 is file a.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot(pub [[char; 8]; 8]);

impl BoardSnapshot {
    pub fn from_board(board: &Board) -> Self {
        let mut grid = [[EMPTY_SQUARE; 8]; 8];
        for (row, cells) in grid.iter_mut().enumerate() {
            let rank = Rank::new(7 - row as u32);
            for (col, cell) in cells.iter_mut().enumerate() {
                let sq = Square::from_coords(File::new(col as u32), rank);
                if let Some(piece) = board.piece_at(sq) {
                    *cell = piece_letter(piece);
                }
            }
        }
        Self(grid)
    }

    /// Rows as vectors of one-character strings, the shape exported records use.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.0
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }
}

impl std::fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// FEN letter: uppercase for white, lowercase for black.
fn piece_letter(piece: Piece) -> char {
    let c = match piece.role {
        Role::Pawn => 'p',
        Role::Knight => 'n',
        Role::Bishop => 'b',
        Role::Rook => 'r',
        Role::Queen => 'q',
        Role::King => 'k',
    };
    if piece.color == Color::White {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

/// Piece groups for one side, in order of first appearance while scanning
/// a1, b1, ..., h8.
fn side_groups(board: &Board, color: Color) -> Vec<(Role, Vec<String>)> {
    let mut groups: Vec<(Role, Vec<String>)> = Vec::new();
    for sq in board.occupied() {
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        if piece.color != color {
            continue;
        }
        match groups.iter_mut().find(|(role, _)| *role == piece.role) {
            Some((_, squares)) => squares.push(sq.to_string()),
            None => groups.push((piece.role, vec![sq.to_string()])),
        }
    }
    groups
}

fn describe_side(board: &Board, color: Color) -> String {
    let name = if color == Color::White { "White" } else { "Black" };
    let groups = side_groups(board, color);
    if groups.is_empty() {
        return format!("{name} has no pieces");
    }

    let parts: Vec<String> = groups
        .iter()
        .map(|(role, squares)| {
            let plural = if squares.len() > 1 { "s" } else { "" };
            format!("{}{plural} on {}", role_name(*role), squares.join(", "))
        })
        .collect();
    format!("{name} has {}", parts.join("; "))
}

/// `"White has .... Black has .... <turn_label>."`
pub fn describe_position(board: &Board, turn_label: &str) -> String {
    format!(
        "{}. {}. {turn_label}.",
        describe_side(board, Color::White),
        describe_side(board, Color::Black)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::{CastlingMode, Chess, Position};

    fn board_from_fen(fen: &str) -> Board {
        let fen: Fen = fen.parse().expect("valid FEN");
        let pos: Chess = fen.into_position(CastlingMode::Standard).expect("legal position");
        pos.board().clone()
    }

    #[test]
    fn test_snapshot_start_position() {
        let snap = BoardSnapshot::from_board(Chess::default().board());
        assert_eq!(snap.0[0], ['r', 'n', 'b', 'q', 'k', 'b', 'n', 'r']);
        assert_eq!(snap.0[1], ['p'; 8]);
        assert_eq!(snap.0[4], [EMPTY_SQUARE; 8]);
        assert_eq!(snap.0[7], ['R', 'N', 'B', 'Q', 'K', 'B', 'N', 'R']);
        assert_eq!(snap.to_string().lines().count(), 8);
        assert!(snap.to_string().starts_with("r n b q k b n r\np p p"));
    }

    #[test]
    fn test_describe_lone_kings_singular() {
        let board = board_from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            describe_position(&board, "true"),
            "White has king on e1. Black has king on e8. true."
        );
    }

    #[test]
    fn test_describe_pluralizes_above_one() {
        let board = board_from_fen("4k3/8/8/8/8/8/PP6/R3K2R w - - 0 1");
        assert_eq!(
            describe_position(&board, "false"),
            "White has rooks on a1, h1; king on e1; pawns on a2, b2. \
             Black has king on e8. false."
        );
    }

    #[test]
    fn test_describe_start_position_black_side() {
        let desc = describe_position(Chess::default().board(), "true");
        assert!(desc.contains(
            "Black has pawns on a7, b7, c7, d7, e7, f7, g7, h7; rooks on a8, h8; \
             knights on b8, g8; bishops on c8, f8; queen on d8; king on e8. true."
        ));
    }
}
