//! Explainability for similarity scores
//!
//! Breaks a weighted similarity down into per-concept contributions so a
//! reviewer can see why two rows were considered similar.

use crosslink_core::{CommonSchema, Row, RowId};
use serde::Serialize;

use crate::search::SimilarRow;

/// What one concept added to a score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub concept: String,
    pub weight: f64,
    /// Unweighted comparator score, absent when either value is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// `similarity * weight`
    pub contribution: f64,
}

/// A weighted similarity with its per-concept breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub score: f64,
    /// Relevant concepts in common row order
    pub contributions: Vec<Contribution>,
}

impl Explanation {
    /// Concept that added the most to the score
    pub fn top_contribution(&self) -> Option<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.contribution > 0.0)
            .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
    }
}

/// Explain `common.weighted_similarity(a, b)`.
///
/// The score is computed exactly as the weighted similarity is, so both agree.
pub fn explain(common: &CommonSchema, a: &Row, b: &Row) -> Explanation {
    let mut score = 0.0;
    let contributions = common
        .relevant()
        .map(|(i, field)| {
            let similarity = common.field_similarity(i, field, a, b);
            let contribution = similarity.map_or(0.0, |s| s * field.weight());
            score += contribution;
            Contribution {
                concept: field.name().to_string(),
                weight: field.weight(),
                similarity,
                contribution,
            }
        })
        .collect();

    Explanation { score, contributions }
}

/// A search result with its explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainedRow {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(flatten)]
    pub explanation: Explanation,
}

impl ExplainedRow {
    pub fn from_similar(common: &CommonSchema, probe: &Row, similar: &SimilarRow<'_>) -> Self {
        Self {
            index: similar.index,
            id: similar.row.id().cloned(),
            explanation: explain(common, similar.row, probe),
        }
    }

    pub fn from_similar_list(common: &CommonSchema, probe: &Row, results: &[SimilarRow<'_>]) -> Vec<Self> {
        results
            .iter()
            .map(|r| Self::from_similar(common, probe, r))
            .collect()
    }
}

/// Summary statistics for a similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityStats {
    /// Number of rows considered
    pub candidates_count: usize,
    pub results_count: usize,
    pub avg_score: f64,
    pub best_score: f64,
    /// Concept that contributed most to the best result
    pub top_contributing_concept: Option<String>,
}

impl SimilarityStats {
    /// Compute stats from explained results sorted best first
    pub fn compute(results: &[ExplainedRow], candidates_count: usize) -> Self {
        let Some(best) = results.first() else {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_concept: None,
            };
        };

        let total: f64 = results.iter().map(|r| r.explanation.score).sum();
        Self {
            candidates_count,
            results_count: results.len(),
            avg_score: total / results.len() as f64,
            best_score: best.explanation.score,
            top_contributing_concept: best
                .explanation
                .top_contribution()
                .map(|c| c.concept.clone()),
        }
    }
}
