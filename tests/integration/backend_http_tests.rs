/*!
 * HTTP backend tests against a scripted local server.
 *
 * These run the real reqwest path end to end: request shape, retry with
 * backoff, the payload repair round-trip and error mapping.
 */

use crate::common::http::{chat_body, spawn_scripted_server, ScriptedResponse};
use doctrans::app_config::BackendConfig;
use doctrans::errors::BackendError;
use doctrans::providers::openai_compat::OpenAiCompatBackend;
use doctrans::providers::TranslationBackend;
use doctrans::translation::batch::TranslationRequest;

const VALID_PAYLOAD: &str = r#"[
    {"en": "Revenue grew", "zh": "收入增长"},
    {"en": "Costs fell", "zh": "成本下降"}
]"#;

fn request() -> TranslationRequest {
    TranslationRequest {
        segments: vec!["Revenue grew".to_string(), "Costs fell".to_string()],
        domain_hint: None,
        stop_words: Vec::new(),
        glossary: Default::default(),
        source_lang: "en".to_string(),
        target_lang: "zh".to_string(),
    }
}

fn backend_for(endpoint: String) -> OpenAiCompatBackend {
    let config = BackendConfig {
        endpoint,
        retry_count: 3,
        retry_backoff_ms: 10,
        timeout_secs: 5,
        ..Default::default()
    };
    OpenAiCompatBackend::new(&config).unwrap()
}

#[tokio::test]
async fn test_translate_parses_a_clean_payload() {
    let endpoint = spawn_scripted_server(vec![ScriptedResponse::ok(chat_body(VALID_PAYLOAD))]).await;
    let backend = backend_for(endpoint);

    let mapping = backend.translate(&request()).await.unwrap();

    let pairs: Vec<(&str, &str)> = mapping.iter().collect();
    assert_eq!(pairs, vec![("Revenue grew", "收入增长"), ("Costs fell", "成本下降")]);
}

#[tokio::test]
async fn test_transient_failure_then_success_yields_the_same_mapping() {
    // A 500 on the first attempt must be invisible in the result
    let flaky = spawn_scripted_server(vec![
        ScriptedResponse::error(500),
        ScriptedResponse::ok(chat_body(VALID_PAYLOAD)),
    ])
    .await;
    let clean = spawn_scripted_server(vec![ScriptedResponse::ok(chat_body(VALID_PAYLOAD))]).await;

    let from_flaky = backend_for(flaky).translate(&request()).await.unwrap();
    let from_clean = backend_for(clean).translate(&request()).await.unwrap();

    let flaky_pairs: Vec<(&str, &str)> = from_flaky.iter().collect();
    let clean_pairs: Vec<(&str, &str)> = from_clean.iter().collect();
    assert_eq!(flaky_pairs, clean_pairs);
}

#[tokio::test]
async fn test_malformed_payload_is_repaired_with_one_extra_round_trip() {
    // First response is prose with no JSON array; the reformat request
    // gets the valid payload. The server scripts exactly two responses, so
    // success proves no third request was made.
    let endpoint = spawn_scripted_server(vec![
        ScriptedResponse::ok(chat_body("Sure! Here are the translations you asked for.")),
        ScriptedResponse::ok(chat_body(VALID_PAYLOAD)),
    ])
    .await;

    let mapping = backend_for(endpoint).translate(&request()).await.unwrap();

    assert_eq!(mapping.len(), 2);
}

#[tokio::test]
async fn test_persistent_failure_exhausts_retries() {
    let endpoint = spawn_scripted_server(vec![
        ScriptedResponse::error(503),
        ScriptedResponse::error(503),
        ScriptedResponse::error(503),
    ])
    .await;

    let result = backend_for(endpoint).translate(&request()).await;

    match result {
        Err(BackendError::RetriesExhausted { attempts, last_error }) => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("503"));
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_test_connection_round_trips() {
    let endpoint = spawn_scripted_server(vec![ScriptedResponse::ok(chat_body("ok"))]).await;
    assert!(backend_for(endpoint).test_connection().await.is_ok());
}

#[tokio::test]
async fn test_classify_domain_reduces_the_answer_to_one_word() {
    let endpoint = spawn_scripted_server(vec![ScriptedResponse::ok(chat_body("Finance.\n"))]).await;
    let domain = backend_for(endpoint).classify_domain("Revenue grew 12%").await.unwrap();
    assert_eq!(domain, "finance");
}
