//! Best-match resolution over noisy title-search results.
//!
//! Strategy: exact → (lexical similarity | recency) → first result.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::SearchCandidate;

/// The fields the resolver reads from a search result.
pub trait Candidate {
    fn primary_name(&self) -> &str;
    fn original_name(&self) -> &str;
    /// First air date or release date, possibly empty.
    fn release_date(&self) -> &str;
}

impl Candidate for SearchCandidate {
    fn primary_name(&self) -> &str {
        &self.primary_name
    }

    fn original_name(&self) -> &str {
        &self.original_name
    }

    fn release_date(&self) -> &str {
        &self.release_date
    }
}

/// How to choose among candidates when no name matches exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Highest [`similarity_score`] against the raw query.
    #[default]
    #[serde(rename = "lexical_similarity", alias = "similarity")]
    ByLexicalSimilarity,
    /// Most recent release or first-air date.
    #[serde(rename = "recency")]
    ByRecency,
}

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchTier {
    Exact,
    Similarity(f64),
    Recency,
    First,
}

/// The chosen candidate, borrowed from the input slice.
#[derive(Debug)]
pub struct BestMatch<'a, C> {
    pub candidate: &'a C,
    pub index: usize,
    pub tier: MatchTier,
}

/// Pick the single best candidate for a query.
///
/// `cleaned_query` drives the exact tier; `raw_query` (the uncleaned title)
/// drives similarity scoring so partial signals lost to cleaning still count.
/// Never reports "no match": callers that need a confidence threshold must
/// post-filter the result themselves.
///
/// Fails only when `candidates` is empty, which is a caller contract
/// violation.
pub fn resolve_best_match<'a, C: Candidate>(
    candidates: &'a [C],
    cleaned_query: &str,
    raw_query: &str,
    strategy: MatchStrategy,
) -> Result<BestMatch<'a, C>, CoreError> {
    if candidates.is_empty() {
        return Err(CoreError::EmptyCandidates);
    }

    let pick = move |index: usize, tier: MatchTier| BestMatch {
        candidate: &candidates[index],
        index,
        tier,
    };

    // Pass 1: exact match on either name.
    if let Some(index) = exact_match(candidates, cleaned_query) {
        return Ok(pick(index, MatchTier::Exact));
    }

    // Pass 2: caller-selected strategy.
    let chosen = match strategy {
        MatchStrategy::ByLexicalSimilarity => {
            most_similar(candidates, raw_query).map(|(i, score)| (i, MatchTier::Similarity(score)))
        }
        MatchStrategy::ByRecency => most_recent(candidates).map(|i| (i, MatchTier::Recency)),
    };

    // Pass 3: first result.
    let (index, tier) = chosen.unwrap_or((0, MatchTier::First));
    Ok(pick(index, tier))
}

/// Score how well `b` matches `a`. Higher is better; not normalized.
///
/// * +3 if `b` contains `a`
/// * +2 if `a` contains `b`
/// * +1 per distinct whitespace token of `a` that also appears in `b`
/// * −0.1 per character of length difference
pub fn similarity_score(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut score = 0.0;

    if b.contains(a.as_str()) {
        score += 3.0;
    }
    if a.contains(b.as_str()) {
        score += 2.0;
    }

    let b_words: HashSet<&str> = b.split_whitespace().collect();
    let shared = a
        .split_whitespace()
        .collect::<HashSet<_>>()
        .intersection(&b_words)
        .count();
    score += shared as f64;

    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    score - (len_a - len_b).abs() * 0.1
}

fn exact_match<C: Candidate>(candidates: &[C], cleaned_query: &str) -> Option<usize> {
    let query = cleaned_query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    candidates.iter().position(|c| {
        [c.primary_name(), c.original_name()]
            .iter()
            .any(|name| !name.is_empty() && name.to_lowercase() == query)
    })
}

/// Highest-scoring candidate; the first one seen wins ties.
fn most_similar<C: Candidate>(candidates: &[C], raw_query: &str) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let score = similarity_score(raw_query, c.primary_name())
            .max(similarity_score(raw_query, c.original_name()));
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
        }
    }
    best
}

/// Newest candidate; the first one seen wins ties.
fn most_recent<C: Candidate>(candidates: &[C]) -> Option<usize> {
    let mut best: Option<(usize, NaiveDate)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let date = parse_release_date(c.release_date());
        if best.map_or(true, |(_, newest)| date > newest) {
            best = Some((i, date));
        }
    }
    best.map(|(i, _)| i)
}

/// Parse `YYYY-MM-DD`, `YYYY-MM` or `YYYY`. Empty or unparsable dates count
/// as the Unix epoch (`NaiveDate::default()`).
fn parse_release_date(raw: &str) -> NaiveDate {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d"))
        .unwrap_or_default()
}
