//! Deduplication of previously exported dataset files.
//!
//! Entries are keyed by their `move_history_copy` value and rewritten with
//! fresh `pos_id`s. A file without duplicates is never touched.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::dedup::{dedup, DedupKey};
use crate::error::DatasetError;
use crate::export::{dataset_path, ExportFormat, View};
use crate::tier::Tier;

const COPY_FIELD: &str = "move_history_copy";
const HISTORY_FIELD: &str = "move_history";
const COPY_PREFIX: &str = "move_history_copy:";

#[derive(Debug, Clone, PartialEq)]
pub enum EntryBody {
    Json(Value),
    /// Trimmed, non-empty lines of a block, without its `pos <n>:` header.
    Block(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedEntry {
    pub key: String,
    pub body: EntryBody,
}

impl DedupKey for ExportedEntry {
    fn dedup_key(&self) -> &str {
        &self.key
    }
}

fn json_key(value: &Value) -> String {
    let field = value.get(COPY_FIELD).or_else(|| value.get(HISTORY_FIELD));
    match field {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => {
            // No history at all: the whole object, keys sorted
            let sorted: BTreeMap<String, Value> = value
                .as_object()
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            if sorted.is_empty() {
                value.to_string()
            } else {
                serde_json::to_string(&sorted).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Parse JSONL content. Lines that are not valid JSON are reported and
/// skipped; the count of skipped lines is returned alongside the entries.
pub fn parse_jsonl_entries(content: &str) -> (Vec<ExportedEntry>, usize) {
    let mut entries = Vec::new();
    let mut invalid = 0;

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => entries.push(ExportedEntry {
                key: json_key(&value),
                body: EntryBody::Json(value),
            }),
            Err(e) => {
                warn!(line = line_num + 1, error = %e, "Skipping invalid JSON line");
                invalid += 1;
            }
        }
    }

    (entries, invalid)
}

/// Parse `pos <n>:` block content. Text before the first header is ignored.
pub fn parse_block_entries(content: &str) -> Vec<ExportedEntry> {
    let header_re = Regex::new(r"(?m)^pos \d+:").unwrap();

    header_re
        .split(content)
        .skip(1)
        .filter_map(|block| {
            let lines: Vec<String> = block
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
            if lines.is_empty() {
                return None;
            }
            let key = lines
                .iter()
                .find_map(|l| l.strip_prefix(COPY_PREFIX))
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| lines.join("\n"));
            Some(ExportedEntry {
                key,
                body: EntryBody::Block(lines),
            })
        })
        .collect()
}

/// Render entries back to file content, renumbering them 1..=n.
pub fn render_entries(entries: &[ExportedEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let pos_id = i + 1;
        match &entry.body {
            EntryBody::Json(value) => {
                let mut value = value.clone();
                if let Some(id) = value.get_mut("pos_id") {
                    *id = Value::from(pos_id);
                }
                out.push_str(&value.to_string());
                out.push('\n');
            }
            EntryBody::Block(lines) => {
                out.push_str(&format!("pos {pos_id}:\n"));
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
            }
        }
    }
    out
}

/// Where a deduplicated file goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupTarget {
    InPlace,
    /// `<stem>_clean.<ext>` next to the input.
    CleanCopy,
}

fn target_path(path: &Path, target: DedupTarget) -> PathBuf {
    match target {
        DedupTarget::InPlace => path.to_path_buf(),
        DedupTarget::CleanCopy => {
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let ext = path.extension().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            path.with_file_name(format!("{stem}_clean.{ext}"))
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileDedupReport {
    pub path: PathBuf,
    pub total: usize,
    pub removed: usize,
    pub invalid_lines: usize,
    /// Output file, or None when nothing needed rewriting.
    pub written: Option<PathBuf>,
}

pub fn dedup_file(
    path: &Path,
    format: ExportFormat,
    target: DedupTarget,
) -> Result<FileDedupReport, DatasetError> {
    let content = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;

    let (entries, invalid_lines) = match format {
        ExportFormat::Jsonl => parse_jsonl_entries(&content),
        ExportFormat::Txt => (parse_block_entries(&content), 0),
    };
    let total = entries.len();
    let unique = dedup(entries);

    info!(
        path = %path.display(),
        total,
        removed = unique.removed,
        remaining = unique.records.len(),
        "Deduplicated dataset file"
    );

    let written = if unique.removed == 0 {
        None
    } else {
        let out = target_path(path, target);
        fs::write(&out, render_entries(&unique.records)).map_err(|e| DatasetError::io(&out, e))?;
        Some(out)
    };

    Ok(FileDedupReport {
        path: path.to_path_buf(),
        total,
        removed: unique.removed,
        invalid_lines,
        written,
    })
}

/// Deduplicate every `{tier}_{view}` file of `format` in `dir`. Each file is
/// handled on its own; failures are logged and returned in place.
pub fn dedup_dataset_dir(
    dir: &Path,
    format: ExportFormat,
    target: DedupTarget,
) -> Vec<Result<FileDedupReport, DatasetError>> {
    let mut results = Vec::new();
    for tier in Tier::EXPORTED {
        for view in View::ALL {
            let path = dataset_path(dir, tier, view, format);
            let result = dedup_file(&path, format, target);
            if let Err(ref e) = result {
                error!(path = %path.display(), error = %e, "Dataset file dedup failed");
            }
            results.push(result);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_key_fallbacks() {
        let (entries, invalid) = parse_jsonl_entries(
            "{\"pos_id\":1,\"move_history_copy\":\"e4\"}\n\
             {\"pos_id\":2,\"move_history\":\"d4\"}\n\
             not json\n\
             \n\
             {\"b\":1,\"a\":2}\n",
        );
        assert_eq!(invalid, 1);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key, "e4");
        assert_eq!(entries[1].key, "d4");
        assert_eq!(entries[2].key, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_block_parsing() {
        let content = "pos 1:\nposition=\"\"\ne4\nmove_history_copy: e4\n\n\
                       pos 2:\nposition=\"\"\nd4\nmove_history_copy: d4\n\n";
        let entries = parse_block_entries(content);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].key, "d4");
        assert_eq!(
            entries[0].body,
            EntryBody::Block(vec![
                "position=\"\"".to_string(),
                "e4".to_string(),
                "move_history_copy: e4".to_string()
            ])
        );
    }

    #[test]
    fn test_render_renumbers() {
        let (entries, _) = parse_jsonl_entries(
            "{\"pos_id\":5,\"position\":\"\",\"move_history_copy\":\"e4\"}\n",
        );
        assert_eq!(
            render_entries(&entries),
            "{\"pos_id\":1,\"position\":\"\",\"move_history_copy\":\"e4\"}\n"
        );

        let blocks = parse_block_entries("pos 9:\nx\nmove_history_copy: c4\n");
        assert_eq!(render_entries(&blocks), "pos 1:\nx\nmove_history_copy: c4\n\n");
    }

    #[test]
    fn test_clean_copy_path() {
        let p = target_path(Path::new("data/hard_history.txt"), DedupTarget::CleanCopy);
        assert_eq!(p, Path::new("data/hard_history_clean.txt"));
        let p = target_path(Path::new("data/hard_history.txt"), DedupTarget::InPlace);
        assert_eq!(p, Path::new("data/hard_history.txt"));
    }
}
