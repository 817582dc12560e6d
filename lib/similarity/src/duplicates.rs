//! Exact-match duplicate search
//!
//! Independent of comparators and of the weighted score: only concepts with
//! weight > 0 take part, and they must be equal.

use ahash::AHashMap;
use crosslink_core::{CommonSchema, Row, ValueKey};
use tracing::debug;

/// Rows equal to `probe` on every relevant concept the probe carries.
///
/// A missing probe value does not filter; a missing candidate value against a
/// present probe value is a mismatch.
pub fn find_duplicates<'a>(rows: &'a [Row], probe: &Row, common: &CommonSchema) -> Vec<&'a Row> {
    let keys: Vec<(usize, _)> = common
        .relevant()
        .filter_map(|(i, _)| probe.get(i).filter(|v| !v.is_null()).map(|v| (i, v)))
        .collect();

    let found: Vec<&Row> = rows
        .iter()
        .filter(|row| keys.iter().all(|(i, value)| row.get(*i) == Some(*value)))
        .collect();

    debug!(rows = rows.len(), keys = keys.len(), found = found.len(), "duplicate search");
    found
}

/// Groups of row positions sharing all relevant concept values.
///
/// Rows missing any relevant value are never grouped. Only groups with at
/// least two members are returned, ordered by their first member.
pub fn group_duplicates(rows: &[Row], common: &CommonSchema) -> Vec<Vec<usize>> {
    let relevant: Vec<usize> = common.relevant().map(|(i, _)| i).collect();

    let mut index: AHashMap<Vec<ValueKey>, usize> = AHashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (pos, row) in rows.iter().enumerate() {
        let key: Option<Vec<ValueKey>> = relevant
            .iter()
            .map(|&i| row.get(i).filter(|v| !v.is_null()).map(|v| v.key()))
            .collect();
        let Some(key) = key else {
            continue;
        };

        match index.get(&key) {
            Some(&group) => groups[group].push(pos),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![pos]);
            }
        }
    }

    groups.retain(|g| g.len() >= 2);
    debug!(rows = rows.len(), groups = groups.len(), "grouped duplicates");
    groups
}
