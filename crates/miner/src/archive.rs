use std::time::Duration;

use chess_core::game_data::GameData;
use chess_core::pgn::parse_pgn;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::MinerError;

const API_BASE: &str = "https://api.chess.com/pub/player";

pub struct ChessComClient {
    client: Client,
    delay: Duration,
}

impl ChessComClient {
    pub fn new(delay: Duration) -> Result<Self, MinerError> {
        let client = Client::builder()
            .user_agent("position-miner/1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MinerError::Archive(format!("HTTP client error: {e}")))?;
        Ok(Self { client, delay })
    }

    async fn get_json(&self, url: &str) -> Result<Value, MinerError> {
        // Rate limit
        tokio::time::sleep(self.delay).await;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MinerError::Archive(format!("Request error for {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(MinerError::Archive(format!("HTTP {} for {url}", resp.status())));
        }

        resp.json()
            .await
            .map_err(|e| MinerError::Archive(format!("JSON parse error for {url}: {e}")))
    }

    /// Monthly archive URLs for a player, oldest first as the API lists them.
    pub async fn fetch_archives(&self, username: &str) -> Result<Vec<String>, MinerError> {
        let url = format!("{API_BASE}/{}/games/archives", username.to_lowercase());
        let data = self.get_json(&url).await?;
        Ok(archive_urls(&data))
    }

    pub async fn fetch_month(&self, archive_url: &str) -> Result<Vec<GameData>, MinerError> {
        let data = self.get_json(archive_url).await?;
        Ok(games_from_month_json(&data))
    }

    /// Every standard game in the player's archive.
    pub async fn fetch_all_games(&self, username: &str) -> Result<Vec<GameData>, MinerError> {
        let archives = self.fetch_archives(username).await?;
        info!(username, months = archives.len(), "Fetching archive");

        let mut games = Vec::new();
        for url in &archives {
            let month = self.fetch_month(url).await?;
            debug!(url = %url, games = month.len(), "Fetched month");
            games.extend(month);
        }

        info!(username, games = games.len(), "Archive fetched");
        Ok(games)
    }
}

fn archive_urls(data: &Value) -> Vec<String> {
    data["archives"]
        .as_array()
        .map(|urls| {
            urls.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a month payload. Variant games and unreadable PGNs are dropped.
pub fn games_from_month_json(data: &Value) -> Vec<GameData> {
    let Some(games) = data["games"].as_array() else {
        return Vec::new();
    };

    games
        .iter()
        .filter(|game| {
            // Skip variant games
            game.get("rules").and_then(|v| v.as_str()).unwrap_or("chess") == "chess"
        })
        .filter_map(|game| game.get("pgn").and_then(|v| v.as_str()))
        .filter_map(parse_pgn)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PGN: &str = "[Event \"Live Chess\"]\n[White \"MagnusCarlsen\"]\n[Black \"Hikaru\"]\n\
                       [Result \"1-0\"]\n[WhiteElo \"3300\"]\n[BlackElo \"3250\"]\n\n\
                       1. e4 {[%clk 0:03:00]} 1... e5 2. Nf3 1-0";

    #[test]
    fn test_month_json_filters_variants() {
        let data = json!({
            "games": [
                { "rules": "chess", "pgn": PGN },
                { "rules": "chess960", "pgn": PGN },
                { "pgn": PGN },
                { "rules": "chess" }
            ]
        });
        let games = games_from_month_json(&data);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].moves, vec!["e4", "e5", "Nf3"]);
        assert_eq!(games[0].metadata.black_elo.as_deref(), Some("3250"));
    }

    #[test]
    fn test_malformed_payloads_give_nothing() {
        assert!(games_from_month_json(&json!({})).is_empty());
        assert!(archive_urls(&json!({ "archives": "nope" })).is_empty());
        assert_eq!(
            archive_urls(&json!({ "archives": ["a/2024/01", 5, "a/2024/02"] })),
            vec!["a/2024/01", "a/2024/02"]
        );
    }
}
