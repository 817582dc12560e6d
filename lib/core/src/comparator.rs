//! Per-concept comparators
//!
//! Every comparator returns a similarity score in range [0.0, 1.0] where 1.0
//! means identical and 0.0 means unrelated.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Capability interface for user supplied comparators
pub trait ValueComparator: Send + Sync {
    fn compare(&self, a: &Value, b: &Value) -> f64;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ValueComparator for F
where
    F: Fn(&Value, &Value) -> f64 + Send + Sync,
{
    fn compare(&self, a: &Value, b: &Value) -> f64 {
        self(a, b)
    }
}

/// Similarity function attached to a common concept
#[derive(Clone, Default)]
pub enum Comparator {
    /// 1 if equal, 0 otherwise
    #[default]
    Exact,
    /// Case-insensitive text equality
    ExactIgnoreCase,
    /// Character trigram overlap
    Trigram,
    /// Jaccard index of whitespace separated tokens
    TokenJaccard,
    /// Fuzzy token-set ratio, robust to word order and extra words
    TokenSet,
    JaroWinkler,
    /// 1 - |a - b| / max(|a|, |b|)
    NumericRelative,
    /// Exponential decay of the absolute difference
    NumericAbsolute,
    /// 1 - days_apart * penalty_per_day, floored at 0
    DayProximity { penalty_per_day: f64 },
    Custom(Arc<dyn ValueComparator>),
}

impl Comparator {
    pub fn custom<C: ValueComparator + 'static>(comparator: C) -> Self {
        Comparator::Custom(Arc::new(comparator))
    }

    /// Score two non-missing values, clamped to [0, 1]
    pub fn compare(&self, a: &Value, b: &Value) -> f64 {
        let score = match self {
            Comparator::Exact => exact_similarity(a, b),
            Comparator::ExactIgnoreCase => {
                if text_of(a).to_lowercase() == text_of(b).to_lowercase() {
                    1.0
                } else {
                    0.0
                }
            }
            Comparator::Trigram => trigram_similarity(&text_of(a), &text_of(b)),
            Comparator::TokenJaccard => jaccard_tokens(&text_of(a), &text_of(b)),
            Comparator::TokenSet => token_set_ratio(&text_of(a), &text_of(b)),
            Comparator::JaroWinkler => {
                strsim::jaro_winkler(&text_of(a).to_lowercase(), &text_of(b).to_lowercase())
            }
            Comparator::NumericRelative => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => relative_similarity(x, y),
                _ => exact_similarity(a, b),
            },
            Comparator::NumericAbsolute => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => absolute_similarity(x, y),
                _ => exact_similarity(a, b),
            },
            Comparator::DayProximity { penalty_per_day } => {
                match (epoch_seconds(a), epoch_seconds(b)) {
                    (Some(x), Some(y)) => {
                        let days = (x - y).abs() / SECONDS_PER_DAY;
                        1.0 - days * penalty_per_day
                    }
                    _ => 0.0,
                }
            }
            Comparator::Custom(custom) => custom.compare(a, b),
        };
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Comparator::Exact => "exact",
            Comparator::ExactIgnoreCase => "exact_ignore_case",
            Comparator::Trigram => "trigram",
            Comparator::TokenJaccard => "token_jaccard",
            Comparator::TokenSet => "token_set",
            Comparator::JaroWinkler => "jaro_winkler",
            Comparator::NumericRelative => "numeric_relative",
            Comparator::NumericAbsolute => "numeric_absolute",
            Comparator::DayProximity { .. } => "day_proximity",
            Comparator::Custom(custom) => custom.name(),
        }
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::DayProximity { penalty_per_day } => f
                .debug_struct("DayProximity")
                .field("penalty_per_day", penalty_per_day)
                .finish(),
            Comparator::Custom(custom) => f.debug_tuple("Custom").field(&custom.name()).finish(),
            other => f.write_str(other.name()),
        }
    }
}

fn exact_similarity(a: &Value, b: &Value) -> f64 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn relative_similarity(a: f64, b: f64) -> f64 {
    let max = a.abs().max(b.abs());
    if max == 0.0 {
        1.0 // Both are zero
    } else {
        (1.0 - (a - b).abs() / max).max(0.0)
    }
}

fn absolute_similarity(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    let scale = (a.abs() + b.abs() + 1.0) / 2.0;
    (-diff / scale).exp()
}

/// Seconds since the Unix epoch for integer timestamps or date text
fn epoch_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(r) => Some(*r),
        Value::Text(s) => {
            let s = s.trim();
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(|dt| dt.and_utc().timestamp() as f64)
        }
        Value::Null => None,
    }
}

/// Jaccard similarity between lowercase whitespace token sets
fn jaccard_tokens(a: &str, b: &str) -> f64 {
    let tokens_a = token_set(a);
    let tokens_b = token_set(b);

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Lowercased words; anything that is not alphanumeric separates words
fn token_set(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Token-set ratio: compare the shared tokens against each side's full token
/// set and keep the best normalized edit similarity
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = token_set(a);
    let tokens_b = token_set(b);

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let sorted_join = |tokens: Vec<&String>| {
        let mut tokens: Vec<&str> = tokens.into_iter().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens.join(" ")
    };

    let common = sorted_join(tokens_a.intersection(&tokens_b).collect());
    let only_a = sorted_join(tokens_a.difference(&tokens_b).collect());
    let only_b = sorted_join(tokens_b.difference(&tokens_a).collect());

    let combine = |rest: &str| {
        if common.is_empty() {
            rest.to_string()
        } else if rest.is_empty() {
            common.clone()
        } else {
            format!("{} {}", common, rest)
        }
    };
    let full_a = combine(&only_a);
    let full_b = combine(&only_b);

    let mut best = strsim::normalized_levenshtein(&full_a, &full_b);
    if !common.is_empty() {
        best = best
            .max(strsim::normalized_levenshtein(&common, &full_a))
            .max(strsim::normalized_levenshtein(&common, &full_b));
    }
    best
}

/// Character trigram similarity for fuzzy text matching
fn trigram_similarity(a: &str, b: &str) -> f64 {
    let trigrams_a = generate_trigrams(&a.to_lowercase());
    let trigrams_b = generate_trigrams(&b.to_lowercase());

    if trigrams_a.is_empty() && trigrams_b.is_empty() {
        return 1.0;
    }

    if trigrams_a.is_empty() || trigrams_b.is_empty() {
        return 0.0;
    }

    let intersection = trigrams_a.intersection(&trigrams_b).count();
    let union = trigrams_a.union(&trigrams_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn generate_trigrams(s: &str) -> HashSet<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return HashSet::new();
    }
    let padded = format!("  {}  ", trimmed);
    let chars: Vec<char> = padded.chars().collect();

    chars.windows(3).map(|w| w.iter().collect::<String>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_default() {
        let cmp = Comparator::default();
        assert_eq!(cmp.compare(&Value::from("a"), &Value::from("a")), 1.0);
        assert_eq!(cmp.compare(&Value::from("a"), &Value::from("A")), 0.0);
        assert_eq!(cmp.compare(&Value::Integer(3), &Value::Integer(3)), 1.0);
    }

    #[test]
    fn test_exact_ignore_case() {
        let cmp = Comparator::ExactIgnoreCase;
        assert_eq!(cmp.compare(&Value::from("Jānis"), &Value::from("JĀNIS")), 1.0);
    }

    #[test]
    fn test_trigram_similarity() {
        let sim = Comparator::Trigram.compare(
            &Value::from("prosciutto cotto"),
            &Value::from("prosciutto crudo"),
        );
        assert!(sim > 0.5);

        let sim2 = Comparator::Trigram.compare(&Value::from("apple"), &Value::from("banana"));
        assert!(sim2 < 0.3);
    }

    #[test]
    fn test_token_set_ignores_order_and_extra_words() {
        let cmp = Comparator::TokenSet;
        assert_eq!(cmp.compare(&Value::from("Wick John"), &Value::from("john wick")), 1.0);
        assert_eq!(
            cmp.compare(&Value::from("John Wick"), &Value::from("John Wick Jr")),
            1.0
        );
        assert!(cmp.compare(&Value::from("John Wick"), &Value::from("Jane Doe")) < 0.5);
    }

    #[test]
    fn test_token_set_ignores_punctuation() {
        let cmp = Comparator::TokenSet;
        assert_eq!(cmp.compare(&Value::from("Wick, John"), &Value::from("John Wick")), 1.0);
        assert_eq!(cmp.compare(&Value::from("O'Neil-Smith"), &Value::from("o neil smith")), 1.0);
        assert_eq!(cmp.compare(&Value::from("...!"), &Value::from("")), 1.0);
    }

    #[test]
    fn test_token_jaccard() {
        let sim = Comparator::TokenJaccard.compare(&Value::from("a b c"), &Value::from("a b d"));
        assert!((sim - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_relative() {
        let cmp = Comparator::NumericRelative;
        assert_eq!(cmp.compare(&Value::Real(10.0), &Value::Real(10.0)), 1.0);
        assert!(cmp.compare(&Value::Real(10.0), &Value::Real(11.0)) > 0.9);
        let sim = cmp.compare(&Value::Integer(10), &Value::Integer(20));
        assert!((0.5..0.6).contains(&sim));
    }

    #[test]
    fn test_numeric_absolute() {
        let cmp = Comparator::NumericAbsolute;
        assert!((cmp.compare(&Value::Real(10.0), &Value::Real(10.0)) - 1.0).abs() < 1e-9);
        assert!(cmp.compare(&Value::Real(10.0), &Value::Real(11.0)) > 0.5);
    }

    #[test]
    fn test_day_proximity_text_and_epoch() {
        let cmp = Comparator::DayProximity { penalty_per_day: 0.1 };
        let sim = cmp.compare(&Value::from("2021-01-18"), &Value::from("2021-01-19"));
        assert!((sim - 0.9).abs() < 1e-9);

        let a = Value::Integer(1_610_928_000);
        let b = Value::Integer(1_610_928_000 + 3 * 86_400);
        assert!((cmp.compare(&a, &b) - 0.7).abs() < 1e-9);

        let far = cmp.compare(&Value::from("2021-01-01"), &Value::from("2022-01-01"));
        assert_eq!(far, 0.0);

        let sim = cmp.compare(
            &Value::from("2021-01-18 15:10:47"),
            &Value::from("2021-01-18 15:10:47"),
        );
        assert_eq!(sim, 1.0);
    }

    #[test]
    fn test_custom_is_clamped() {
        let cmp = Comparator::custom(|_: &Value, _: &Value| 3.0);
        assert_eq!(cmp.compare(&Value::Null, &Value::Null), 1.0);
        let cmp = Comparator::custom(|_: &Value, _: &Value| f64::NAN);
        assert_eq!(cmp.compare(&Value::Null, &Value::Null), 0.0);
    }

    #[test]
    fn test_trigram_generation() {
        let trigrams = generate_trigrams("hello");
        assert!(trigrams.contains("hel"));
        assert!(trigrams.contains("ell"));
        assert!(trigrams.contains("llo"));
        assert!(generate_trigrams("  ").is_empty());
    }
}
