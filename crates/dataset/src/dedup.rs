//! Move-history deduplication.

use std::collections::HashSet;

/// Identity of a record for deduplication. Compared verbatim.
pub trait DedupKey {
    fn dedup_key(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct Deduplicated<T> {
    pub records: Vec<T>,
    pub removed: usize,
}

/// Drop every record whose key was already seen. First occurrence wins and
/// order is preserved.
pub fn dedup<T, I>(records: I) -> Deduplicated<T>
where
    T: DedupKey,
    I: IntoIterator<Item = T>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    let mut removed = 0;

    for rec in records {
        if seen.insert(rec.dedup_key().to_string()) {
            kept.push(rec);
        } else {
            removed += 1;
        }
    }

    Deduplicated {
        records: kept,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NormalizedRecord;

    fn rec(history: &str, board: &str) -> NormalizedRecord {
        NormalizedRecord {
            move_history: history.to_string(),
            board: board.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let out = dedup(vec![rec("e4", "first"), rec("d4", "x"), rec("e4", "second")]);
        assert_eq!(out.removed, 1);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].board, "first");
        assert_eq!(out.records[1].move_history, "d4");
    }

    #[test]
    fn test_key_is_verbatim() {
        let out = dedup(vec![rec("e4 e5", ""), rec("e4  e5", ""), rec(" e4 e5", "")]);
        assert_eq!(out.removed, 0);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let first = dedup(vec![rec("a", ""), rec("b", ""), rec("a", ""), rec("c", ""), rec("b", "")]);
        assert_eq!(first.removed, 2);

        let again = dedup(first.records.clone());
        assert_eq!(again.removed, 0);
        assert_eq!(again.records, first.records);
    }
}
