//! Per-tier dataset files.
//!
//! Each tier is written as three views sharing `pos_id` and
//! `move_history_copy`: `turn_board`, `history` and `verbal`. Files are named
//! `{tier}_{view}.{ext}`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::{error, info};

use crate::error::DatasetError;
use crate::record::CanonicalRecord;
use crate::tier::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One JSON object per line.
    Jsonl,
    /// `pos <id>:` blocks.
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Txt => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(ExportFormat::Jsonl),
            "txt" | "text" => Ok(ExportFormat::Txt),
            other => Err(format!("unknown dataset format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    TurnBoard,
    History,
    Verbal,
}

impl View {
    pub const ALL: [View; 3] = [View::TurnBoard, View::History, View::Verbal];

    pub fn name(self) -> &'static str {
        match self {
            View::TurnBoard => "turn_board",
            View::History => "history",
            View::Verbal => "verbal",
        }
    }
}

pub fn dataset_path(dir: &Path, tier: Tier, view: View, format: ExportFormat) -> PathBuf {
    dir.join(format!("{}_{}.{}", tier.name(), view.name(), format.extension()))
}

#[derive(Serialize)]
struct TurnBoardLine<'a> {
    pos_id: usize,
    position: &'a str,
    turn: &'a str,
    board: &'a str,
    move_history_copy: &'a str,
}

#[derive(Serialize)]
struct HistoryLine<'a> {
    pos_id: usize,
    position: &'a str,
    move_history: &'a str,
    move_history_copy: &'a str,
}

#[derive(Serialize)]
struct VerbalLine<'a> {
    pos_id: usize,
    position: &'a str,
    verbal: &'a str,
    move_history_copy: &'a str,
}

/// One JSON line (without the trailing newline) for `rec` in `view`.
pub fn render_jsonl(view: View, rec: &CanonicalRecord) -> Result<String, DatasetError> {
    let line = match view {
        View::TurnBoard => serde_json::to_string(&TurnBoardLine {
            pos_id: rec.pos_id,
            position: &rec.position,
            turn: &rec.turn,
            board: &rec.board,
            move_history_copy: &rec.move_history_copy,
        })?,
        View::History => serde_json::to_string(&HistoryLine {
            pos_id: rec.pos_id,
            position: &rec.position,
            move_history: &rec.move_history,
            move_history_copy: &rec.move_history_copy,
        })?,
        View::Verbal => serde_json::to_string(&VerbalLine {
            pos_id: rec.pos_id,
            position: &rec.position,
            verbal: &rec.verbal,
            move_history_copy: &rec.move_history_copy,
        })?,
    };
    Ok(line)
}

/// One `pos <id>:` block for `rec` in `view`, ending with a blank line.
pub fn render_block(view: View, rec: &CanonicalRecord) -> Result<String, DatasetError> {
    let mut out = format!("pos {}:\n", rec.pos_id);
    out.push_str(&format!("position={}\n", serde_json::to_string(&rec.position)?));
    match view {
        View::TurnBoard => {
            out.push_str(&format!("turn: {}\n", rec.turn));
            out.push_str(&format!("board:\n{}\n", rec.board));
        }
        View::History => out.push_str(&format!("{}\n", rec.move_history)),
        View::Verbal => out.push_str(&format!("{}\n", rec.verbal)),
    }
    out.push_str(&format!("move_history_copy: {}\n\n", rec.move_history_copy));
    Ok(out)
}

fn render(view: View, format: ExportFormat, rec: &CanonicalRecord) -> Result<String, DatasetError> {
    match format {
        ExportFormat::Jsonl => Ok(render_jsonl(view, rec)? + "\n"),
        ExportFormat::Txt => render_block(view, rec),
    }
}

pub fn ensure_output_dir(dir: &Path) -> Result<(), DatasetError> {
    fs::create_dir_all(dir).map_err(|e| DatasetError::io(dir, e))
}

/// Write one view file, replacing any previous content.
pub fn write_view(
    dir: &Path,
    tier: Tier,
    view: View,
    format: ExportFormat,
    records: &[CanonicalRecord],
) -> Result<PathBuf, DatasetError> {
    let path = dataset_path(dir, tier, view, format);
    let file = File::create(&path).map_err(|e| DatasetError::io(&path, e))?;
    let mut writer = BufWriter::new(file);

    for rec in records {
        writer
            .write_all(render(view, format, rec)?.as_bytes())
            .map_err(|e| DatasetError::io(&path, e))?;
    }
    writer.flush().map_err(|e| DatasetError::io(&path, e))?;

    Ok(path)
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, DatasetError)>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write all three views of a tier. A failing view is logged and recorded;
/// the remaining views are still written.
pub fn export_tier(
    dir: &Path,
    tier: Tier,
    records: &[CanonicalRecord],
    format: ExportFormat,
    report: &mut ExportReport,
) {
    for view in View::ALL {
        match write_view(dir, tier, view, format, records) {
            Ok(path) => {
                info!(path = %path.display(), count = records.len(), "Dataset view written");
                report.written.push(path);
            }
            Err(e) => {
                error!(tier = %tier, view = view.name(), error = %e, "Failed to write dataset view");
                report.failed.push((dataset_path(dir, tier, view, format), e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CanonicalRecord {
        CanonicalRecord {
            pos_id: 3,
            position: "".to_string(),
            turn: "true".to_string(),
            board: "r n\nP .".to_string(),
            move_history: "e4 e5".to_string(),
            move_history_copy: "e4 e5".to_string(),
            verbal: "White has king on e1. Black has king on e8. true.".to_string(),
        }
    }

    #[test]
    fn test_jsonl_field_order() {
        let rec = record();
        assert_eq!(
            render_jsonl(View::TurnBoard, &rec).unwrap(),
            r#"{"pos_id":3,"position":"","turn":"true","board":"r n\nP .","move_history_copy":"e4 e5"}"#
        );
        assert_eq!(
            render_jsonl(View::History, &rec).unwrap(),
            r#"{"pos_id":3,"position":"","move_history":"e4 e5","move_history_copy":"e4 e5"}"#
        );
        assert!(render_jsonl(View::Verbal, &rec)
            .unwrap()
            .starts_with(r#"{"pos_id":3,"position":"","verbal":"White has king"#));
    }

    #[test]
    fn test_block_layout() {
        let rec = record();
        assert_eq!(
            render_block(View::TurnBoard, &rec).unwrap(),
            "pos 3:\nposition=\"\"\nturn: true\nboard:\nr n\nP .\nmove_history_copy: e4 e5\n\n"
        );
        assert_eq!(
            render_block(View::History, &rec).unwrap(),
            "pos 3:\nposition=\"\"\ne4 e5\nmove_history_copy: e4 e5\n\n"
        );
    }

    #[test]
    fn test_dataset_path_naming() {
        let p = dataset_path(Path::new("data"), Tier::Hard, View::TurnBoard, ExportFormat::Jsonl);
        assert_eq!(p, Path::new("data").join("hard_turn_board.jsonl"));
        let p = dataset_path(Path::new("data"), Tier::Easy, View::Verbal, ExportFormat::Txt);
        assert_eq!(p, Path::new("data").join("easy_verbal.txt"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSONL".parse::<ExportFormat>(), Ok(ExportFormat::Jsonl));
        assert_eq!("txt".parse::<ExportFormat>(), Ok(ExportFormat::Txt));
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
