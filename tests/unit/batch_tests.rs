/*!
 * Batch encoding tests
 */

use doctrans::app_config::BackendConfig;
use doctrans::document::{TextUnit, UnitLocation};
use doctrans::translation::batch::{domain_sample, BatchEncoder};

fn units(texts: &[&str]) -> Vec<TextUnit> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| TextUnit::new(t.to_string(), UnitLocation::paragraph(0, 0, i), "zh"))
        .collect()
}

fn encoder_for(backend: &BackendConfig) -> BatchEncoder {
    BatchEncoder::with_backend(backend, "en", "zh")
}

#[test]
fn test_encode_mixed_container_keeps_only_translatable_segments_in_order() {
    let units = units(&["Q3 Highlights", "42", "Revenue grew 12%", "Costs fell"]);
    let request = encoder_for(&BackendConfig::default()).encode(0, &units, None).unwrap();

    // "42" is a page number, "Revenue grew 12%" carries words so it stays
    assert_eq!(request.segments, vec!["Q3 Highlights", "Revenue grew 12%", "Costs fell"]);
    assert_eq!(
        request.encoded_body(),
        "【Q3 Highlights】\n【Revenue grew 12%】\n【Costs fell】"
    );
}

#[test]
fn test_encode_carries_terms_and_languages_from_config() {
    let backend = BackendConfig {
        stop_words: vec!["EBITDA".to_string()],
        glossary: [("revenue".to_string(), "营收".to_string())].into_iter().collect(),
        ..Default::default()
    };
    let units = units(&["Revenue grew"]);
    let request = encoder_for(&backend).encode(0, &units, Some("finance")).unwrap();

    assert_eq!(request.source_lang, "en");
    assert_eq!(request.target_lang, "zh");
    assert_eq!(request.stop_words, vec!["EBITDA"]);
    assert_eq!(request.glossary.get("revenue").map(String::as_str), Some("营收"));
    assert_eq!(request.domain_hint.as_deref(), Some("finance"));
}

#[test]
fn test_domain_sample_skips_numeric_noise() {
    let units = units(&["42", "Quarterly results", "1,234"]);
    assert_eq!(domain_sample(&units), "Quarterly results");
}
