/*!
 * Translation backend clients.
 *
 * The engine talks to its translation service through the
 * `TranslationBackend` trait. `openai_compat` implements it against any
 * chat-completions style HTTP endpoint; `mock` provides a scriptable
 * implementation for tests.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::classifier::clean_control_chars;
use crate::errors::BackendError;
use crate::translation::batch::TranslationRequest;
use crate::translation::TranslationMapping;

pub mod mock;
pub mod openai_compat;

/// Interface every translation backend implements
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate one container's batch, returning unordered pairs
    async fn translate(&self, request: &TranslationRequest)
        -> Result<TranslationMapping, BackendError>;

    /// Classify the document's domain from a text sample ("finance",
    /// "medical", "general", ...)
    async fn classify_domain(&self, sample: &str) -> Result<String, BackendError>;

    /// Verify the backend is reachable and the model responds
    async fn test_connection(&self) -> Result<(), BackendError>;
}

/// Parse a backend payload into a mapping.
///
/// The expected shape is a JSON array of objects keyed by the two language
/// codes, e.g. `[{"en": "Revenue grew", "zh": "收入增长"}]`. Models wrap
/// the array in prose or code fences often enough that parsing starts from
/// the outermost bracket pair, and control characters are stripped first.
pub fn parse_mapping(
    payload: &str,
    source_lang: &str,
    target_lang: &str,
) -> Result<TranslationMapping, BackendError> {
    let cleaned = clean_control_chars(payload);
    let start = cleaned
        .find('[')
        .ok_or_else(|| BackendError::ParseError("no JSON array in payload".to_string()))?;
    let end = cleaned
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| BackendError::ParseError("unterminated JSON array in payload".to_string()))?;

    let entries: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(&cleaned[start..=end])
            .map_err(|e| BackendError::ParseError(format!("invalid JSON array: {}", e)))?;

    let mut mapping = TranslationMapping::new();
    for entry in &entries {
        let source = entry.get(source_lang).and_then(|v| v.as_str());
        let target = entry.get(target_lang).and_then(|v| v.as_str());
        if let (Some(source), Some(target)) = (source, target) {
            mapping.push(source, target);
        }
    }

    if mapping.is_empty() && !entries.is_empty() {
        return Err(BackendError::ParseError(format!(
            "payload entries carry neither '{}' nor '{}' keys",
            source_lang, target_lang
        )));
    }

    Ok(mapping)
}
