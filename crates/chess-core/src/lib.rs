//! Chess-side building blocks: game data, PGN parsing, the games file,
//! source game selection and board rendering.

pub mod board;
pub mod game_data;
pub mod game_file;
pub mod pgn;
pub mod selection;
