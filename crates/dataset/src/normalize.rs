//! Reconciles the record shapes older producers wrote into one
//! [`NormalizedRecord`].
//!
//! Accepted inputs:
//! - an object with named fields (several historical aliases per field)
//! - `[board, turn, history, verbal]`
//! - a 5-element array with the position label either first or last
//! - any other array, sorted out by element type
//!
//! [`normalize`] is total: unknown or missing data becomes an empty string.

use serde_json::{Map, Value};

use crate::record::NormalizedRecord;

const POSITION_KEYS: &[&str] = &["pos", "position"];
const BOARD_KEYS: &[&str] = &["board"];
const TURN_KEYS: &[&str] = &["white_to_move", "turn", "wtm"];
const HISTORY_KEYS: &[&str] = &["move_history", "history", "moves"];
const VERBAL_KEYS: &[&str] = &["verbal", "description"];

/// Minimum line breaks for a string to be taken as a rendered board.
const BOARD_MIN_NEWLINES: usize = 7;
/// Minimum opening brackets for a string to be taken as a serialized grid.
const BOARD_MIN_BRACKETS: usize = 2;

pub fn normalize(rec: &Value) -> NormalizedRecord {
    match rec {
        Value::Object(map) => from_fields(map),
        Value::Array(items) => from_sequence(items),
        scalar => NormalizedRecord {
            board: format_board(Some(scalar)),
            ..Default::default()
        },
    }
}

/// A structured grid, or text with enough line breaks or brackets to be one.
pub fn looks_like_board(value: &Value) -> bool {
    match value {
        Value::Array(_) => true,
        Value::String(s) => {
            s.matches('\n').count() >= BOARD_MIN_NEWLINES
                || s.matches('[').count() >= BOARD_MIN_BRACKETS
        }
        _ => false,
    }
}

fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !is_blank(v))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn from_fields(map: &Map<String, Value>) -> NormalizedRecord {
    NormalizedRecord {
        position: format_text(field(map, POSITION_KEYS)),
        board: format_board(field(map, BOARD_KEYS)),
        turn: format_text(field(map, TURN_KEYS)),
        move_history: format_text(field(map, HISTORY_KEYS)),
        verbal: format_text(field(map, VERBAL_KEYS)),
    }
}

fn from_sequence(items: &[Value]) -> NormalizedRecord {
    match items {
        [board, turn, history, verbal] => build(None, Some(board), Some(turn), Some(history), Some(verbal)),
        [first, a, b, c, d] if looks_like_board(first) => {
            build(Some(d), Some(first), Some(a), Some(b), Some(c))
        }
        [label, board, turn, history, verbal] => {
            build(Some(label), Some(board), Some(turn), Some(history), Some(verbal))
        }
        _ => from_unordered(items),
    }
}

/// Any other length: take the first boolean as turn, the first board-like
/// element as board, then history, verbal and label from what is left.
fn from_unordered(items: &[Value]) -> NormalizedRecord {
    let mut rest: Vec<&Value> = items.iter().collect();

    let turn = rest
        .iter()
        .position(|v| v.is_boolean())
        .map(|i| rest.remove(i));
    let board = rest
        .iter()
        .position(|v| looks_like_board(v))
        .map(|i| rest.remove(i));

    let mut rest = rest.into_iter();
    let history = rest.next();
    let verbal = rest.next();
    let label = rest.next();

    build(label, board, turn, history, verbal)
}

fn build(
    label: Option<&Value>,
    board: Option<&Value>,
    turn: Option<&Value>,
    history: Option<&Value>,
    verbal: Option<&Value>,
) -> NormalizedRecord {
    NormalizedRecord {
        position: format_text(label),
        board: format_board(board),
        turn: format_text(turn),
        move_history: format_text(history),
        verbal: format_text(verbal),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Rows of cells become lines of space-separated cells; text passes through.
pub fn format_board(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(rows)) => rows
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.iter().map(render_scalar).collect::<Vec<_>>().join(" "),
                other => render_scalar(other),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => render_scalar(other),
        None => String::new(),
    }
}

/// Sequences are joined with spaces; everything else renders as plain text.
pub fn format_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items.iter().map(render_scalar).collect::<Vec<_>>().join(" "),
        Some(other) => render_scalar(other),
        None => String::new(),
    }
}
