//! Threshold-based similarity search over common-normalized rows

use crosslink_core::{CommonSchema, Row};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

/// A row that scored at or above the threshold against a probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarRow<'a> {
    /// Position in the searched collection
    pub index: usize,
    pub row: &'a Row,
    pub score: f64,
}

/// One entry of a similar group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarMatch {
    pub index: usize,
    pub score: f64,
}

/// Row `index` together with every other row similar to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarGroup {
    pub index: usize,
    /// Sorted by score descending, ties by position
    pub matches: Vec<SimilarMatch>,
}

/// Knobs of the all-pairs scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Number of contiguous slices scanned in parallel. 0 uses one slice per
    /// rayon worker, 1 scans sequentially.
    pub parallelism: usize,
    /// Stop starting new outer rows after this instant
    pub deadline: Option<Instant>,
}

impl ScanOptions {
    pub fn sequential() -> Self {
        Self {
            parallelism: 1,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Result of an all-pairs scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub groups: Vec<SimilarGroup>,
    /// False when the deadline cut the scan short; `groups` then holds what
    /// was found for the rows scanned so far
    pub completed: bool,
}

/// Rows of `rows` scoring at least `threshold` against `probe`, best first.
///
/// Ties keep their input order.
pub fn find_similar<'a>(rows: &'a [Row], probe: &Row, common: &CommonSchema, threshold: f64) -> Vec<SimilarRow<'a>> {
    let mut results: Vec<SimilarRow<'a>> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let score = common.weighted_similarity(row, probe);
            (score >= threshold).then_some(SimilarRow { index, row, score })
        })
        .collect();

    // Stable sort keeps equal scores in row order
    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    debug!(rows = rows.len(), matched = results.len(), threshold, "similarity search");
    results
}

/// Every row paired with the other rows similar to it, sequentially.
///
/// Rows without any match are left out; a row never matches itself.
pub fn find_all_similar(rows: &[Row], common: &CommonSchema, threshold: f64) -> Vec<SimilarGroup> {
    find_all_similar_with(rows, common, threshold, &ScanOptions::sequential()).groups
}

/// All-pairs scan with optional parallelism and deadline.
///
/// The output does not depend on `parallelism`: slices are merged back in
/// row order.
pub fn find_all_similar_with(
    rows: &[Row],
    common: &CommonSchema,
    threshold: f64,
    options: &ScanOptions,
) -> ScanOutcome {
    let slices = match options.parallelism {
        0 => rayon::current_num_threads(),
        n => n,
    };

    let outcome = if slices <= 1 || rows.len() < 2 {
        scan_range(rows, 0..rows.len(), common, threshold, options.deadline)
    } else {
        let chunk_size = rows.len().div_ceil(slices);
        let partial: Vec<ScanOutcome> = rows
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(k, chunk)| {
                let start = k * chunk_size;
                scan_range(rows, start..start + chunk.len(), common, threshold, options.deadline)
            })
            .collect();

        let completed = partial.iter().all(|p| p.completed);
        ScanOutcome {
            groups: partial.into_iter().flat_map(|p| p.groups).collect(),
            completed,
        }
    };

    if !outcome.completed {
        warn!(
            rows = rows.len(),
            groups = outcome.groups.len(),
            "all-pairs scan stopped at deadline"
        );
    }
    debug!(
        rows = rows.len(),
        groups = outcome.groups.len(),
        slices,
        threshold,
        "all-pairs scan"
    );
    outcome
}

fn scan_range(
    rows: &[Row],
    range: std::ops::Range<usize>,
    common: &CommonSchema,
    threshold: f64,
    deadline: Option<Instant>,
) -> ScanOutcome {
    let mut groups = Vec::new();
    for i in range {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return ScanOutcome {
                groups,
                completed: false,
            };
        }

        let matches: Vec<SimilarMatch> = find_similar(rows, &rows[i], common, threshold)
            .into_iter()
            .filter(|m| m.index != i)
            .map(|m| SimilarMatch {
                index: m.index,
                score: m.score,
            })
            .collect();
        if !matches.is_empty() {
            groups.push(SimilarGroup { index: i, matches });
        }
    }
    ScanOutcome {
        groups,
        completed: true,
    }
}
