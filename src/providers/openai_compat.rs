/*!
 * Chat-completions HTTP backend.
 *
 * Speaks the OpenAI-compatible `/chat/completions` shape, which local
 * servers (Ollama, vLLM) and hosted services all expose. One `translate`
 * call covers one container batch: build the prompt, post with retry and
 * exponential backoff, parse the JSON pairs, and on a malformed payload ask
 * the model once to reformat its own output before giving up.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::BackendConfig;
use crate::diagnostics::probe_endpoint;
use crate::errors::BackendError;
use crate::translation::batch::TranslationRequest;
use crate::translation::TranslationMapping;

use super::{parse_mapping, TranslationBackend};

/// Chat message for the wire request
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    /// system, user or assistant
    role: String,
    /// Message text
    content: String,
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// Chat-completions response body, reduced to what we read
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// HTTP client for any chat-completions compatible translation service
#[derive(Debug)]
pub struct OpenAiCompatBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
    backoff_base_ms: u64,
    /// The diagnostic probe runs at most once per client
    probed: AtomicBool,
}

impl OpenAiCompatBackend {
    /// Build a client from backend config, validating the endpoint URL
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Url::parse(&config.endpoint).map_err(|e| {
            BackendError::RequestFailed(format!("invalid endpoint '{}': {}", config.endpoint, e))
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::RequestFailed(format!("failed to build client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.retry_count.max(1),
            backoff_base_ms: config.retry_backoff_ms,
            probed: AtomicBool::new(false),
        })
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << attempt.min(16)))
    }

    /// One POST to /chat/completions, returning the assistant text
    async fn chat(&self, system: &str, user: &str) -> Result<String, BackendError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system.to_string() },
                ChatMessage { role: "user".to_string(), content: user.to_string() },
            ],
            temperature: 0.3,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Content-Type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                BackendError::ConnectionError(e.to_string())
            } else {
                BackendError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!("Backend returned {}: {}", status, message);
            return Err(BackendError::ApiError { status_code: status.as_u16(), message });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(format!("response body: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| BackendError::ParseError("response has no choices".to_string()))
    }

    /// Run the one-off connectivity probe on the first transient failure
    async fn maybe_probe(&self) {
        if !self.probed.swap(true, Ordering::SeqCst) {
            let report = probe_endpoint(&self.endpoint).await;
            warn!("Backend connection trouble; {}", report.summary());
        }
    }

    /// Ask the model once to turn its own malformed payload into strict JSON
    async fn repair_payload(
        &self,
        raw: &str,
        request: &TranslationRequest,
    ) -> Result<TranslationMapping, BackendError> {
        debug!("Payload did not parse, requesting a reformat");
        let system = format!(
            "Reformat the user's content into a strict JSON array of objects with exactly \
             two string keys, \"{}\" and \"{}\". Output only the JSON array.",
            request.source_lang, request.target_lang
        );
        let repaired = self.chat(&system, raw).await?;
        parse_mapping(&repaired, &request.source_lang, &request.target_lang)
    }

    fn translation_system_prompt(request: &TranslationRequest) -> String {
        let mut prompt = format!(
            "You are a professional translator. Translate each segment from {} to {}. \
             Segments are wrapped in 【 and 】, one per line; translate the text inside \
             the markers and never translate the markers themselves.",
            request.source_lang, request.target_lang
        );
        if let Some(domain) = &request.domain_hint {
            prompt.push_str(&format!(" The document domain is {}.", domain));
        }
        if !request.stop_words.is_empty() {
            prompt.push_str(&format!(
                " Leave these terms untranslated: {}.",
                request.stop_words.join(", ")
            ));
        }
        for (term, preferred) in &request.glossary {
            prompt.push_str(&format!(" Translate \"{}\" as \"{}\".", term, preferred));
        }
        prompt.push_str(&format!(
            " Respond with only a JSON array of objects, one per segment, each with \
             exactly two string keys: \"{}\" holding the original segment text without \
             markers and \"{}\" holding its translation.",
            request.source_lang, request.target_lang
        ));
        prompt
    }
}

#[async_trait]
impl TranslationBackend for OpenAiCompatBackend {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationMapping, BackendError> {
        let system = Self::translation_system_prompt(request);
        let user = request.encoded_body();

        let mut last_error = String::new();
        for attempt in 0..self.max_retries {
            match self.chat(&system, &user).await {
                Ok(payload) => {
                    return match parse_mapping(&payload, &request.source_lang, &request.target_lang)
                    {
                        Ok(mapping) => Ok(mapping),
                        // One repair round-trip; a second parse failure is final
                        Err(BackendError::ParseError(_)) => {
                            self.repair_payload(&payload, request).await
                        }
                        Err(other) => Err(other),
                    };
                }
                Err(e) => {
                    if e.is_transient() {
                        self.maybe_probe().await;
                    }
                    warn!(
                        "Backend call failed (attempt {}/{}): {}",
                        attempt + 1,
                        self.max_retries,
                        e
                    );
                    last_error = e.to_string();
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(BackendError::RetriesExhausted { attempts: self.max_retries, last_error })
    }

    async fn classify_domain(&self, sample: &str) -> Result<String, BackendError> {
        let system = "Classify the document excerpt into a single lowercase domain word \
                      such as finance, legal, medical, technology or general. Respond with \
                      only that word.";
        let answer = self.chat(system, sample).await?;
        let domain = answer
            .split_whitespace()
            .next()
            .unwrap_or("general")
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if domain.is_empty() {
            return Ok("general".to_string());
        }
        Ok(domain)
    }

    async fn test_connection(&self) -> Result<(), BackendError> {
        self.chat("Respond with the single word: ok", "ping").await.map(|_| ())
    }
}
