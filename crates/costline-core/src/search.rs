//! # Fuzzy Product Search
//!
//! Ranks catalog entries against a free-text query.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  query "ro membrane 75"                                                 │
//! │      │                                                                  │
//! │      ├── empty? ──► first `browse_limit` items, catalog order          │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  score every name (0..=100) with a SimilarityScorer                    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  stable sort, best first (ties keep catalog order)                     │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  keep top `limit` raw matches ──► then drop score <= threshold         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Returning fewer than `limit` hits is normal: the threshold runs on the
//! already truncated list.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::Named;
use crate::{DEFAULT_BROWSE_LIMIT, DEFAULT_SCORE_THRESHOLD, DEFAULT_SEARCH_LIMIT};

// =============================================================================
// Options & Hits
// =============================================================================

/// Tuning knobs for one search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Raw matches kept before thresholding.
    pub limit: usize,
    /// Scores must be strictly greater than this.
    pub score_threshold: f64,
    /// Items returned for an empty query.
    pub browse_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            limit: DEFAULT_SEARCH_LIMIT,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            browse_limit: DEFAULT_BROWSE_LIMIT,
        }
    }
}

/// One ranked result.
#[derive(Debug, Clone)]
pub struct SearchHit<'a, T> {
    pub item: &'a T,
    /// `None` for browse results (empty query).
    pub score: Option<f64>,
    /// Index of `item` in the searched slice.
    pub position: usize,
}

// =============================================================================
// Scorer Trait
// =============================================================================

/// Similarity between a query and a candidate name, in `[0, 100]`.
pub trait SimilarityScorer {
    fn score(&self, query: &str, candidate: &str) -> f64;
}

/// Weighted combination of plain, partial, token-sort and token-set ratios.
///
/// ## Scoring
/// ```text
/// base = ratio(q, c)
/// len_ratio = longer / shorter          (normalized lengths)
///
/// len_ratio < 1.5   →  max(base, 0.95·token_sort, 0.95·token_set)
/// otherwise         →  s = 0.9 (len_ratio < 8) or 0.6
///                      max(base, s·partial, 0.95·s·partial_token_sort,
///                          0.95·s·partial_token_set)
/// ```
/// Every ratio is normalized Levenshtein similarity × 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRatio;

impl SimilarityScorer for WeightedRatio {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        let q = normalize(query);
        let c = normalize(candidate);
        if q.is_empty() || c.is_empty() {
            return 0.0;
        }

        let base = ratio(&q, &c);

        let (q_len, c_len) = (q.chars().count() as f64, c.chars().count() as f64);
        let len_ratio = q_len.max(c_len) / q_len.min(c_len);

        let q_sorted = sorted_tokens(&q);
        let c_sorted = sorted_tokens(&c);

        if len_ratio < 1.5 {
            let sort = ratio(&q_sorted, &c_sorted) * 0.95;
            let set = token_set_ratio(&q, &c, ratio) * 0.95;
            return base.max(sort).max(set);
        }

        let scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
        let partial = partial_ratio(&q, &c) * scale;
        let partial_sort = partial_ratio(&q_sorted, &c_sorted) * 0.95 * scale;
        let partial_set = token_set_ratio(&q, &c, partial_ratio) * 0.95 * scale;

        base.max(partial).max(partial_sort).max(partial_set)
    }
}

// =============================================================================
// Ratios
// =============================================================================

/// Lower-cases, folds common Latin diacritics, and collapses every run of
/// non-alphanumerics to one space.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.chars().flat_map(char::to_lowercase) {
        // combining dot left behind by lower-casing 'İ'
        if c == '\u{0307}' {
            continue;
        }
        let c = match c {
            'ı' | 'î' | 'ï' | 'í' | 'ì' => 'i',
            'ş' | 'š' => 's',
            'ğ' => 'g',
            'ç' | 'č' => 'c',
            'ö' | 'ô' | 'ó' | 'ò' | 'ø' => 'o',
            'ü' | 'û' | 'ú' | 'ù' => 'u',
            'â' | 'ä' | 'á' | 'à' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            other => other,
        };
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best ratio of the shorter string against every equally long window of
/// the longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    if width == 0 {
        return 0.0;
    }
    if width == long_chars.len() {
        return ratio(short, long);
    }

    long_chars
        .windows(width)
        .map(|window| {
            let window: String = window.iter().collect();
            ratio(short, &window)
        })
        .fold(0.0, f64::max)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Compares the shared tokens against each side's shared + leftover tokens.
fn token_set_ratio(a: &str, b: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    let a_tokens: BTreeSet<&str> = a.split_whitespace().collect();
    let b_tokens: BTreeSet<&str> = b.split_whitespace().collect();

    let common = join(a_tokens.intersection(&b_tokens));
    let only_a = join(a_tokens.difference(&b_tokens));
    let only_b = join(b_tokens.difference(&a_tokens));

    let combined_a = concat(&common, &only_a);
    let combined_b = concat(&common, &only_b);

    let mut best = scorer(&combined_a, &combined_b);
    if !common.is_empty() {
        best = best
            .max(scorer(&common, &combined_a))
            .max(scorer(&common, &combined_b));
    }
    best
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.map(|t| *t).collect::<Vec<&str>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}

// =============================================================================
// Search
// =============================================================================

/// Searches with the default [`WeightedRatio`] scorer.
///
/// ## Example
/// ```rust
/// use costline_core::search::{search, SearchOptions};
/// use costline_core::types::Named;
///
/// struct Item(&'static str);
/// impl Named for Item {
///     fn name(&self) -> &str { self.0 }
/// }
///
/// let items = [Item("RO Membrane 75 GPD"), Item("Sediment Cartridge"), Item("Faucet")];
/// let hits = search(&items, "membrane 75", &SearchOptions::default());
/// assert_eq!(hits[0].item.0, "RO Membrane 75 GPD");
/// ```
pub fn search<'a, T: Named>(
    items: &'a [T],
    query: &str,
    options: &SearchOptions,
) -> Vec<SearchHit<'a, T>> {
    search_with(items, query, options, &WeightedRatio)
}

/// Searches with any [`SimilarityScorer`].
pub fn search_with<'a, T: Named, S: SimilarityScorer + ?Sized>(
    items: &'a [T],
    query: &str,
    options: &SearchOptions,
    scorer: &S,
) -> Vec<SearchHit<'a, T>> {
    let query = query.trim();

    if query.is_empty() {
        return items
            .iter()
            .enumerate()
            .take(options.browse_limit)
            .map(|(position, item)| SearchHit {
                item,
                score: None,
                position,
            })
            .collect();
    }

    let mut scored: Vec<(usize, &T, f64)> = items
        .iter()
        .enumerate()
        .map(|(position, item)| (position, item, scorer.score(query, item.name())))
        .collect();

    // sort_by is stable: equal scores keep catalog order
    scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
    scored.truncate(options.limit);

    scored
        .into_iter()
        .filter(|(_, _, score)| *score > options.score_threshold)
        .map(|(position, item, score)| SearchHit {
            item,
            score: Some(score),
            position,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    struct Item(String);

    impl Named for Item {
        fn name(&self) -> &str {
            &self.0
        }
    }

    fn items(names: &[&str]) -> Vec<Item> {
        names.iter().map(|n| Item(n.to_string())).collect()
    }

    /// Scores come from a fixed table keyed by candidate name.
    struct TableScorer(HashMap<String, f64>);

    impl SimilarityScorer for TableScorer {
        fn score(&self, _query: &str, candidate: &str) -> f64 {
            self.0.get(candidate).copied().unwrap_or(0.0)
        }
    }

    /// Every candidate gets the same score.
    struct FlatScorer(f64);

    impl SimilarityScorer for FlatScorer {
        fn score(&self, _query: &str, _candidate: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  RO-Membrane, 75 GPD "), "ro membrane 75 gpd");
        assert_eq!(normalize("Şebeke Girişi"), "sebeke girisi");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn test_weighted_ratio_bounds() {
        let s = WeightedRatio;
        assert!((s.score("Faucet", "faucet") - 100.0).abs() < 1e-9);
        assert_eq!(s.score("", "faucet"), 0.0);
        assert_eq!(s.score("faucet", "!!"), 0.0);
        let v = s.score("membrane", "RO Membrane 75 GPD");
        assert!(v > 60.0 && v <= 100.0, "got {v}");
    }

    #[test]
    fn test_weighted_ratio_token_order() {
        let s = WeightedRatio;
        assert!(s.score("membrane ro", "RO Membrane") >= 95.0 - 1e-9);
    }

    #[test]
    fn test_weighted_ratio_ranks_typos_above_noise() {
        let s = WeightedRatio;
        let typo = s.score("membrain", "Membrane");
        let noise = s.score("membrain", "Faucet");
        assert!(typo > noise);
        assert!(typo > 60.0);
    }

    #[test]
    fn test_empty_query_returns_browse_slice() {
        let names: Vec<String> = (0..80).map(|i| format!("Item {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let catalog = items(&refs);

        let hits = search(&catalog, "   ", &SearchOptions::default());
        assert_eq!(hits.len(), 50);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[49].item.0, "Item 49");
        assert!(hits.iter().all(|h| h.score.is_none()));
    }

    #[test]
    fn test_threshold_is_strict() {
        let catalog = items(&["exactly sixty", "sixty one"]);
        let scorer = TableScorer(HashMap::from([
            ("exactly sixty".to_string(), 60.0),
            ("sixty one".to_string(), 61.0),
        ]));

        let hits = search_with(&catalog, "q", &SearchOptions::default(), &scorer);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item.0, "sixty one");
        assert_eq!(hits[0].score, Some(61.0));
    }

    #[test]
    fn test_limit_applies_before_threshold() {
        let names: Vec<String> = (0..50).map(|i| format!("Cartridge {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let catalog = items(&refs);

        let hits = search_with(&catalog, "cartridge", &SearchOptions::default(), &FlatScorer(90.0));
        assert_eq!(hits.len(), 20);
    }

    #[test]
    fn test_fewer_than_limit_is_valid() {
        let catalog = items(&["a", "b", "c"]);
        let scorer = TableScorer(HashMap::from([
            ("a".to_string(), 95.0),
            ("b".to_string(), 80.0),
            ("c".to_string(), 70.0),
        ]));
        let options = SearchOptions {
            limit: 2,
            score_threshold: 85.0,
            ..SearchOptions::default()
        };

        let hits = search_with(&catalog, "q", &options, &scorer);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item.0, "a");
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = items(&["first", "second", "third"]);
        let hits = search_with(&catalog, "q", &SearchOptions::default(), &FlatScorer(75.0));
        let order: Vec<_> = hits.iter().map(|h| h.position).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_higher_scores_first() {
        let catalog = items(&["low", "high", "mid"]);
        let scorer = TableScorer(HashMap::from([
            ("low".to_string(), 65.0),
            ("high".to_string(), 99.0),
            ("mid".to_string(), 80.0),
        ]));
        let hits = search_with(&catalog, "q", &SearchOptions::default(), &scorer);
        let names: Vec<_> = hits.iter().map(|h| h.item.0.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_real_scorer_finds_product() {
        let catalog = items(&[
            "Sediment Cartridge 10\"",
            "RO Membrane 75 GPD",
            "Post Carbon Filter",
            "Chrome Faucet",
        ]);
        let hits = search(&catalog, "ro membrane", &SearchOptions::default());
        assert!(!hits.is_empty());
        assert_eq!(hits[0].item.0, "RO Membrane 75 GPD");
    }
}
