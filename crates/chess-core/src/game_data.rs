use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2"
    /// Raw `WhiteElo` header text, kept unparsed so ranking can decide.
    pub white_elo: Option<String>,
    pub black_elo: Option<String>,
    pub date: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
}

impl GameData {
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Rating of whichever side is not `subject`. Missing or unparsable
    /// ratings count as 0.
    pub fn opponent_rating(&self, subject: &str) -> u32 {
        let raw = if self.metadata.white.eq_ignore_ascii_case(subject) {
            self.metadata.black_elo.as_deref()
        } else {
            self.metadata.white_elo.as_deref()
        };
        raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(white: &str, white_elo: Option<&str>, black_elo: Option<&str>) -> GameData {
        GameData {
            metadata: GameMetadata {
                white: white.to_string(),
                black: "someone".to_string(),
                white_elo: white_elo.map(String::from),
                black_elo: black_elo.map(String::from),
                ..Default::default()
            },
            moves: vec!["e4".into(), "e5".into()],
        }
    }

    #[test]
    fn test_opponent_rating_picks_other_side() {
        let g = game("MagnusCarlsen", Some("2830"), Some("2750"));
        assert_eq!(g.opponent_rating("magnuscarlsen"), 2750);

        let g = game("Hikaru", Some("2800"), Some("2830"));
        assert_eq!(g.opponent_rating("magnuscarlsen"), 2800);
    }

    #[test]
    fn test_opponent_rating_unparsable_is_zero() {
        let g = game("magnuscarlsen", None, Some("?"));
        assert_eq!(g.opponent_rating("magnuscarlsen"), 0);

        let g = game("magnuscarlsen", None, None);
        assert_eq!(g.opponent_rating("magnuscarlsen"), 0);
    }
}
