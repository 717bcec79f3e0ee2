/*!
 * Batch encoding of extracted units.
 *
 * One container becomes one backend request. Segments are wrapped in 【…】
 * markers and joined with newlines so the model sees stable boundaries it
 * can echo back, and the prompt side carries the language pair, optional
 * domain hint, stop words and glossary.
 */

use std::collections::HashMap;

use crate::app_config::{BackendConfig, Config};
use crate::document::TextUnit;
use crate::errors::EncodingError;

/// Opening segment marker
pub const SEGMENT_OPEN: char = '【';
/// Closing segment marker
pub const SEGMENT_CLOSE: char = '】';

/// Characters of container text sampled for domain classification
const DOMAIN_SAMPLE_CHARS: usize = 500;

/// One backend call's worth of work, built from a single container
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Translatable segment texts in extraction order
    pub segments: Vec<String>,
    /// Document domain hint ("finance", "medical", ...) when classified
    pub domain_hint: Option<String>,
    /// Terms the backend must leave untranslated
    pub stop_words: Vec<String>,
    /// Preferred term translations
    pub glossary: HashMap<String, String>,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
}

impl TranslationRequest {
    /// Segments wrapped in boundary markers, one per line
    pub fn encoded_body(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("{}{}{}", SEGMENT_OPEN, s, SEGMENT_CLOSE))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds translation requests from extracted units
#[derive(Debug, Clone)]
pub struct BatchEncoder {
    source_lang: String,
    target_lang: String,
    stop_words: Vec<String>,
    glossary: HashMap<String, String>,
}

impl BatchEncoder {
    /// Encoder carrying the language pair and term lists from config
    pub fn new(config: &Config) -> Self {
        Self::with_backend(&config.backend, &config.source_language, &config.target_language)
    }

    /// Encoder from backend config and an explicit language pair
    pub fn with_backend(backend: &BackendConfig, source_lang: &str, target_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            stop_words: backend.stop_words.clone(),
            glossary: backend.glossary.clone(),
        }
    }

    /// Build the request for one container's units.
    ///
    /// Only translatable units become segments; their order is extraction
    /// order. A container with nothing translatable is a no-op for callers.
    pub fn encode(
        &self,
        container: usize,
        units: &[TextUnit],
        domain_hint: Option<&str>,
    ) -> Result<TranslationRequest, EncodingError> {
        let segments: Vec<String> = units
            .iter()
            .filter(|u| u.is_translatable())
            .map(|u| u.content.trim().to_string())
            .collect();

        if segments.is_empty() {
            return Err(EncodingError::NoTranslatableUnits(container));
        }

        Ok(TranslationRequest {
            segments,
            domain_hint: domain_hint.map(String::from),
            stop_words: self.stop_words.clone(),
            glossary: self.glossary.clone(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
        })
    }
}

/// Sample of a container's translatable text for domain classification,
/// cut at a char boundary around 500 characters.
pub fn domain_sample(units: &[TextUnit]) -> String {
    let mut sample = String::new();
    for unit in units.iter().filter(|u| u.is_translatable()) {
        if !sample.is_empty() {
            sample.push(' ');
        }
        sample.push_str(unit.content.trim());
        if sample.chars().count() >= DOMAIN_SAMPLE_CHARS {
            return sample.chars().take(DOMAIN_SAMPLE_CHARS).collect();
        }
    }
    sample
}
