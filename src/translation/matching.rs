/*!
 * Source/translation re-alignment.
 *
 * The backend returns source -> translation pairs in whatever order the
 * model produced them, often with reformatted or partially altered source
 * text. This module re-aligns each extracted unit to its translation with a
 * cascade of strategies, strictest first: exact text match, normalized
 * match, then weighted similarity scoring. Every strategy consumes the
 * mapping entry it matched so one translation is never applied twice while
 * unmatched units remain.
 */

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{TextUnit, UnitKind};

use super::TranslationMapping;

static MD_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"!?\[([^\]]*)\]\([^\)]*\)").unwrap());

/// Similarity acceptance threshold below which a unit stays unmatched
#[derive(Debug, Clone, Copy)]
pub struct MatchThresholds {
    /// Threshold for free-text paragraphs
    pub paragraph: f32,
    /// Threshold for table cells, tighter because cells are short
    pub cell: f32,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self { paragraph: 0.6, cell: 0.75 }
    }
}

impl MatchThresholds {
    fn for_kind(&self, kind: UnitKind) -> f32 {
        match kind {
            UnitKind::Paragraph => self.paragraph,
            UnitKind::TableCell => self.cell,
        }
    }
}

/// Which cascade stage produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Source text identical after markup stripping
    Exact,
    /// Identical after lowercasing and dropping punctuation and whitespace
    Normalized,
    /// Weighted similarity score at or above the kind's threshold
    Similarity,
}

/// A successful alignment of one unit to one mapping entry
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Translation text to apply
    pub translation: String,
    /// Cascade stage that matched
    pub strategy: MatchStrategy,
    /// Confidence: 1.0 exact, 0.9 normalized, the score for similarity
    pub confidence: f32,
}

/// Strip inline markup the model tends to echo back: markdown emphasis,
/// code ticks, links reduced to their text, and the batch segment brackets.
pub fn strip_inline_markup(text: &str) -> String {
    let delinked = MD_LINK.replace_all(text, "$1");
    delinked
        .replace("**", "")
        .replace("__", "")
        .replace('*', "")
        .replace('`', "")
        .replace('【', "")
        .replace('】', "")
        .trim()
        .to_string()
}

/// Collapse a string to its alphanumeric characters, lowercased. Punctuation
/// and whitespace differences disappear at this stage of the cascade.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Levenshtein distance over arbitrary equatable items, two-row variant
fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr_row[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// Character-level similarity, 1.0 for identical strings
pub fn char_sequence_ratio(a: &str, b: &str) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let a_chars: Vec<char> = a.to_lowercase().chars().collect();
    let b_chars: Vec<char> = b.to_lowercase().chars().collect();
    let max_len = a_chars.len().max(b_chars.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(&a_chars, &b_chars) as f32 / max_len as f32)
}

/// Word-order similarity over whitespace tokens
pub fn word_sequence_ratio(a: &str, b: &str) -> f32 {
    let a_words: Vec<String> = a.to_lowercase().split_whitespace().map(String::from).collect();
    let b_words: Vec<String> = b.to_lowercase().split_whitespace().map(String::from).collect();
    if a_words.is_empty() && b_words.is_empty() {
        return 1.0;
    }
    let max_len = a_words.len().max(b_words.len());
    1.0 - (levenshtein(&a_words, &b_words) as f32 / max_len as f32)
}

/// Ratio of the shorter length to the longer, in characters
pub fn length_ratio(a: &str, b: &str) -> f32 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 && b_len == 0 {
        return 1.0;
    }
    let max = a_len.max(b_len);
    if max == 0 {
        return 1.0;
    }
    a_len.min(b_len) as f32 / max as f32
}

/// Jaccard overlap of lowercase whitespace tokens
pub fn token_overlap(a: &str, b: &str) -> f32 {
    let a_tokens: HashSet<String> =
        a.to_lowercase().split_whitespace().map(String::from).collect();
    let b_tokens: HashSet<String> =
        b.to_lowercase().split_whitespace().map(String::from).collect();
    if a_tokens.is_empty() && b_tokens.is_empty() {
        return 1.0;
    }
    let intersection = a_tokens.intersection(&b_tokens).count();
    let union = a_tokens.union(&b_tokens).count();
    if union == 0 {
        return 1.0;
    }
    intersection as f32 / union as f32
}

/// Weighted similarity between a unit's text and a mapping entry's source.
///
/// Paragraphs weigh in token overlap because sentences share vocabulary
/// even when the model rephrases; cells are too short for tokens to help.
pub fn similarity_score(unit_text: &str, entry_source: &str, kind: UnitKind) -> f32 {
    let char_ratio = char_sequence_ratio(unit_text, entry_source);
    let len_ratio = length_ratio(unit_text, entry_source);
    match kind {
        UnitKind::Paragraph => {
            0.4 * char_ratio + 0.3 * len_ratio + 0.3 * token_overlap(unit_text, entry_source)
        }
        UnitKind::TableCell => 0.7 * char_ratio + 0.3 * len_ratio,
    }
}

/// Similarity used by the mutator to decide whether the translation is
/// already present at the target location, weighting word order over exact
/// characters.
pub fn insertion_similarity(existing: &str, candidate: &str) -> f32 {
    0.6 * char_sequence_ratio(existing, candidate) + 0.4 * word_sequence_ratio(existing, candidate)
}

/// Align one unit against the mapping.
///
/// `used` holds the sources of mapping entries already consumed by earlier
/// units of the same container; every successful match adds to it. Ties at
/// the similarity stage break toward the entry that appeared first in the
/// backend payload.
pub fn match_unit(
    unit_text: &str,
    kind: UnitKind,
    mapping: &TranslationMapping,
    used: &mut HashSet<String>,
    thresholds: &MatchThresholds,
) -> Option<MatchResult> {
    let stripped = strip_inline_markup(unit_text);

    // Stage 1: exact after markup stripping
    for (source, translation) in mapping.iter() {
        if used.contains(source) {
            continue;
        }
        if strip_inline_markup(source) == stripped {
            used.insert(source.to_string());
            return Some(MatchResult {
                translation: translation.to_string(),
                strategy: MatchStrategy::Exact,
                confidence: 1.0,
            });
        }
    }

    // Stage 2: normalized
    let normalized = normalize(&stripped);
    if !normalized.is_empty() {
        for (source, translation) in mapping.iter() {
            if used.contains(source) {
                continue;
            }
            if normalize(&strip_inline_markup(source)) == normalized {
                used.insert(source.to_string());
                return Some(MatchResult {
                    translation: translation.to_string(),
                    strategy: MatchStrategy::Normalized,
                    confidence: 0.9,
                });
            }
        }
    }

    // Stage 3: weighted similarity, first-seen wins on equal scores
    let threshold = thresholds.for_kind(kind);
    let mut best: Option<(String, String, f32)> = None;
    for (source, translation) in mapping.iter() {
        if used.contains(source) {
            continue;
        }
        let score = similarity_score(&stripped, &strip_inline_markup(source), kind);
        if score >= threshold && best.as_ref().is_none_or(|(_, _, s)| score > *s) {
            best = Some((source.to_string(), translation.to_string(), score));
        }
    }
    if let Some((source, translation, score)) = best {
        used.insert(source);
        return Some(MatchResult {
            translation,
            strategy: MatchStrategy::Similarity,
            confidence: score,
        });
    }

    None
}

/// Whether a unit found a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// A mapping entry was consumed for this unit
    Matched,
    /// No entry matched; the original text stays untouched
    Unmatched,
}

/// Alignment outcome for one unit of a container
#[derive(Debug, Clone)]
pub struct UnitMatch {
    /// Index of the unit in the extraction-order slice
    pub unit_index: usize,
    /// Matched or left alone
    pub status: MatchStatus,
    /// Present iff status is `Matched`
    pub result: Option<MatchResult>,
}

/// Align a container's units against one backend mapping, in extraction
/// order. Non-translatable units are reported `Unmatched` without touching
/// the mapping.
pub fn match_units(
    units: &[TextUnit],
    mapping: &TranslationMapping,
    used: &mut HashSet<String>,
    thresholds: &MatchThresholds,
) -> Vec<UnitMatch> {
    units
        .iter()
        .enumerate()
        .map(|(unit_index, unit)| {
            let result = if unit.is_translatable() {
                match_unit(&unit.content, unit.location.kind(), mapping, used, thresholds)
            } else {
                None
            };
            let status =
                if result.is_some() { MatchStatus::Matched } else { MatchStatus::Unmatched };
            UnitMatch { unit_index, status, result }
        })
        .collect()
}
