/*!
 * Translation pipeline internals.
 *
 * `batch` turns extracted units into backend requests, `matching` re-aligns
 * the unordered source/translation pairs the backend returns, `formatting`
 * snapshots run attributes around writes, and `mutator` performs the actual
 * in-place document edits. `pipeline` drives a whole document job.
 */

pub mod batch;
pub mod formatting;
pub mod matching;
pub mod mutator;
pub mod pipeline;

use serde::{Deserialize, Serialize};

/// Ordered source -> translation pairs returned by one backend call.
///
/// Order is the order entries appeared in the backend payload, which makes
/// tie-breaking in the matcher deterministic. Duplicate sources keep the
/// first translation seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationMapping {
    entries: Vec<(String, String)>,
}

impl TranslationMapping {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair, keeping the first translation for a repeated source
    pub fn push(&mut self, source: impl Into<String>, translation: impl Into<String>) {
        let source = source.into();
        if self.entries.iter().any(|(s, _)| *s == source) {
            return;
        }
        self.entries.push((source, translation.into()));
    }

    /// Pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping holds no pairs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for TranslationMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (source, translation) in iter {
            mapping.push(source, translation);
        }
        mapping
    }
}
