/*!
 * Fragment classification.
 *
 * Decides whether a text fragment is worth sending to the translation
 * backend. Pure functions, no side effects: the orchestrator never calls
 * `write` for a unit classified as non-translatable.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Outcome of classifying one fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Worth translating
    Translatable,
    /// Skipped, with the reason recorded
    Skip(SkipReason),
}

impl Classification {
    /// Whether the fragment should be sent to the backend
    pub fn is_translatable(&self) -> bool {
        matches!(self, Self::Translatable)
    }
}

/// Why a fragment was not submitted for translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Empty or whitespace-only
    Empty,
    /// Digits, decimal points, percent signs, hyphens only
    NumericOnly,
    /// Punctuation with no word characters
    PunctuationOnly,
    /// A single character
    SingleChar,
    /// 1-3 digit integer, most likely a page number
    PageNumber,
    /// Looks like a bibliographic reference ("12 Smith & Jones, 2019")
    Reference,
    /// A markdown image marker with nothing else on the line
    ImageOnly,
    /// Decorative runs of dashes, underscores and similar
    SpecialChars,
    /// Mostly non-ASCII while the target language uses a non-Latin script;
    /// the fragment is probably already in the target language
    AlreadyTargetScript,
}

static NUMERIC_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s\.,\-%]+$").unwrap());
static PUNCT_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\w\s]+$").unwrap());
static SPECIAL_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s\-_=+\*#@$%^&()]+$").unwrap());
static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").unwrap());
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s*[A-Za-z&\s\.\-]+,\s*\d{4}").unwrap());
static IMAGE_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!\[[^\]]*\]\([^\)]*\)$").unwrap());

/// Target languages written in a non-Latin script, for the
/// "already in target language" heuristic.
const NON_LATIN_TARGETS: &[&str] = &["zh", "ja", "ko", "ar", "ru", "th", "el", "he"];

fn target_uses_non_latin_script(target_lang: &str) -> bool {
    let code = target_lang.to_lowercase();
    let primary = code.split(['-', '_']).next().unwrap_or(&code);
    NON_LATIN_TARGETS.contains(&primary)
}

/// Classify a fragment for the given target language.
///
/// The checks mirror what presentation decks actually contain: page numbers,
/// reference lines, decorative separators, and numeric table cells.
pub fn classify(text: &str, target_lang: &str) -> Classification {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Classification::Skip(SkipReason::Empty);
    }

    if PAGE_NUMBER.is_match(trimmed) {
        return Classification::Skip(SkipReason::PageNumber);
    }

    if NUMERIC_ONLY.is_match(trimmed) {
        return Classification::Skip(SkipReason::NumericOnly);
    }

    if PUNCT_ONLY.is_match(trimmed) {
        return Classification::Skip(SkipReason::PunctuationOnly);
    }

    if trimmed.chars().count() <= 1 {
        return Classification::Skip(SkipReason::SingleChar);
    }

    if SPECIAL_ONLY.is_match(trimmed) {
        return Classification::Skip(SkipReason::SpecialChars);
    }

    if REFERENCE.is_match(trimmed) {
        return Classification::Skip(SkipReason::Reference);
    }

    if IMAGE_ONLY.is_match(trimmed) {
        return Classification::Skip(SkipReason::ImageOnly);
    }

    if target_uses_non_latin_script(target_lang) {
        let total = trimmed.chars().count();
        let non_ascii = trimmed.chars().filter(|c| !c.is_ascii()).count();
        if total > 0 && (non_ascii as f32 / total as f32) > 0.6 {
            return Classification::Skip(SkipReason::AlreadyTargetScript);
        }
    }

    Classification::Translatable
}

/// Remove invisible control characters that break document object models.
/// Newlines and tabs survive.
pub fn clean_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{00}'..='\u{08}' | '\u{0b}'..='\u{1f}' | '\u{7f}'))
        .collect()
}
