//! Source game ranking.

use crate::game_data::GameData;

/// Ranking key: opponent rating first, then game length in plies.
pub fn game_quality_metric(game: &GameData, subject: &str) -> (u32, usize) {
    (game.opponent_rating(subject), game.ply_count())
}

/// Keep the `top_n` best games, best first. The sort is stable, so games
/// with equal keys stay in pool order.
pub fn select_top_games(mut pool: Vec<GameData>, subject: &str, top_n: usize) -> Vec<GameData> {
    pool.sort_by(|a, b| game_quality_metric(b, subject).cmp(&game_quality_metric(a, subject)));
    pool.truncate(top_n);
    pool
}
