//! Plain-text games file used to hand selected games from the selector to
//! the miner.
//!
//! ```text
//! game
//! 1. e4
//! e5
//! 2. Nf3
//! ```

use std::fs;
use std::io;
use std::path::Path;

use crate::game_data::GameData;

const GAME_HEADER: &str = "game";

/// Render one game: a `game` line, numbered white moves, bare black moves.
pub fn format_game_as_lines(moves: &[String]) -> String {
    let mut out = vec![GAME_HEADER.to_string()];
    for (ply, san) in moves.iter().enumerate() {
        if ply % 2 == 0 {
            out.push(format!("{}. {san}", ply / 2 + 1));
        } else {
            out.push(san.clone());
        }
    }
    out.join("\n")
}

/// Render a whole games file. Games are separated by a single newline.
pub fn format_games(games: &[GameData]) -> String {
    games
        .iter()
        .map(|g| format_game_as_lines(&g.moves))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_games_file(path: &Path, games: &[GameData]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, format_games(games))
}

/// Parse games file content into per-game SAN move lists.
pub fn parse_games(content: &str) -> Vec<Vec<String>> {
    let mut games = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.eq_ignore_ascii_case(GAME_HEADER) {
            if !current.is_empty() {
                games.push(std::mem::take(&mut current));
            }
        } else if line.contains('.') {
            // Strip move numbers like "1." or "12..."
            current.extend(
                line.split_whitespace()
                    .filter(|tok| !tok.contains('.'))
                    .map(String::from),
            );
        } else {
            current.push(line.to_string());
        }
    }

    if !current.is_empty() {
        games.push(current);
    }

    games
}

pub fn read_games_file(path: &Path) -> io::Result<Vec<Vec<String>>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_games(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_game_as_lines() {
        let text = format_game_as_lines(&moves(&["e4", "e5", "Nf3"]));
        assert_eq!(text, "game\n1. e4\ne5\n2. Nf3");
    }

    #[test]
    fn test_parse_games_splits_on_header() {
        let content = "game\n1. e4\ne5\n2. Nf3\nNc6\ngame\n1. d4\n\n  d5  \n";
        let games = parse_games(content);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0], moves(&["e4", "e5", "Nf3", "Nc6"]));
        assert_eq!(games[1], moves(&["d4", "d5"]));
    }

    #[test]
    fn test_parse_games_inline_numbers() {
        let games = parse_games("GAME\n1. e4 e5 2. Nf3\n");
        assert_eq!(games, vec![moves(&["e4", "e5", "Nf3"])]);
    }

    #[test]
    fn test_format_then_parse_keeps_moves() {
        let games = vec![
            GameData { moves: moves(&["e4", "c5", "Nf3"]), ..Default::default() },
            GameData { moves: moves(&["d4"]), ..Default::default() },
        ];
        let parsed = parse_games(&format_games(&games));
        assert_eq!(parsed, vec![moves(&["e4", "c5", "Nf3"]), moves(&["d4"])]);
    }
}
