/*!
 * Mock backend implementations for testing.
 *
 * Behaviors cover what the pipeline has to survive:
 * - `MockBackend::working()` - translates every segment deterministically
 * - `MockBackend::reversed()` - same, but returns the pairs out of order
 * - `MockBackend::fail_first(n)` - transient failures before succeeding
 * - `MockBackend::failing()` - every call errors
 * - `MockBackend::slow(ms)` - delays each call, for concurrency assertions
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::BackendError;
use crate::translation::batch::TranslationRequest;
use crate::translation::TranslationMapping;

use super::TranslationBackend;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds, pairs in segment order
    Working,
    /// Always succeeds, pairs in reverse segment order
    Reversed,
    /// First `failures` calls fail with a connection error, then succeeds
    FailFirst {
        /// Number of leading calls that fail
        failures: usize,
    },
    /// Every call fails with a 500
    Failing,
    /// Succeeds after a delay
    Slow {
        /// Delay per call in milliseconds
        delay_ms: u64,
    },
}

/// Scriptable backend for tests
#[derive(Debug)]
pub struct MockBackend {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    translate_fn: fn(&str) -> String,
    domain: String,
}

fn default_translation(segment: &str) -> String {
    format!("译:{}", segment)
}

impl MockBackend {
    /// Mock with the given behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            translate_fn: default_translation,
            domain: "general".to_string(),
        }
    }

    /// Always-succeeding mock
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Mock that returns the mapping in reverse order
    pub fn reversed() -> Self {
        Self::new(MockBehavior::Reversed)
    }

    /// Mock whose first `failures` calls fail transiently
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Always-failing mock
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Mock that sleeps `delay_ms` per call
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Override the per-segment translation function
    pub fn with_translator(mut self, translate_fn: fn(&str) -> String) -> Self {
        self.translate_fn = translate_fn;
        self
    }

    /// Override the domain returned by `classify_domain`
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Total `translate` calls made so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of `translate` calls observed in flight at once
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn build_mapping(&self, request: &TranslationRequest, reversed: bool) -> TranslationMapping {
        let mut mapping = TranslationMapping::new();
        let translate = self.translate_fn;
        if reversed {
            for segment in request.segments.iter().rev() {
                mapping.push(segment.clone(), translate(segment));
            }
        } else {
            for segment in &request.segments {
                mapping.push(segment.clone(), translate(segment));
            }
        }
        mapping
    }
}

impl Clone for MockBackend {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            in_flight: Arc::clone(&self.in_flight),
            max_in_flight: Arc::clone(&self.max_in_flight),
            translate_fn: self.translate_fn,
            domain: self.domain.clone(),
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationMapping, BackendError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = match self.behavior {
            MockBehavior::Working => Ok(self.build_mapping(request, false)),
            MockBehavior::Reversed => Ok(self.build_mapping(request, true)),
            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    Err(BackendError::ConnectionError(format!(
                        "simulated connection failure #{}",
                        count + 1
                    )))
                } else {
                    Ok(self.build_mapping(request, false))
                }
            }
            MockBehavior::Failing => Err(BackendError::ApiError {
                status_code: 500,
                message: "simulated backend failure".to_string(),
            }),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.build_mapping(request, false))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn classify_domain(&self, _sample: &str) -> Result<String, BackendError> {
        Ok(self.domain.clone())
    }

    async fn test_connection(&self) -> Result<(), BackendError> {
        match self.behavior {
            MockBehavior::Failing => Err(BackendError::ConnectionError(
                "simulated backend failure".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
