/*!
 * Document job orchestration.
 *
 * One document is one job. Containers are independent units of work that
 * run concurrently up to the configured backend cap; within a container
 * extraction, translation, matching and application run in sequence and
 * units are applied in extraction order. A container that fails leaves its
 * siblings running, and containers applied before a cancellation or failure
 * keep their mutations.
 */

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::app_config::Config;
use crate::document::{DocumentModel, TextUnit};
use crate::errors::{EncodingError, JobError};
use crate::providers::TranslationBackend;
use crate::renderer::RendererSupervisor;
use crate::translation::batch::{domain_sample, BatchEncoder};
use crate::translation::matching::{match_units, MatchStatus, MatchThresholds};
use crate::translation::mutator::{apply, ApplyOutcome, MutationSettings};

/// Lifecycle of one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting for admission
    Queued,
    /// Reading units out of the document
    Extracting,
    /// Backend calls in flight
    Translating,
    /// Re-aligning backend pairs to units
    Matching,
    /// Writing translations into the document
    Applying,
    /// All containers processed
    Done,
    /// Terminal failure; applied containers keep their mutations
    Failed,
}

impl JobState {
    /// Whether the job can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Cooperative cancellation, honored between containers. In-flight backend
/// calls run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// New, uncancelled flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives progress updates after each container finishes, whether it
/// succeeded or not, so `completed` always reaches `total`
pub trait ProgressSink: Send + Sync {
    /// `completed` of `total` containers finished
    fn report(&self, job_id: Uuid, completed: usize, total: usize);
}

/// Default sink that logs progress
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, job_id: Uuid, completed: usize, total: usize) {
        info!("Job {}: {}/{} containers done", job_id, completed, total);
    }
}

/// Outcome of one finished job
#[derive(Debug, Clone)]
pub struct JobSummary {
    /// Job identifier
    pub job_id: Uuid,
    /// Terminal state, `Done` or `Failed`
    pub state: JobState,
    /// When the job started
    pub started_at: DateTime<Utc>,
    /// When the job finished
    pub finished_at: DateTime<Utc>,
    /// Containers in the document
    pub total_containers: usize,
    /// Containers fully processed (including ones with nothing to translate)
    pub completed_containers: usize,
    /// Containers that failed and were left as-is
    pub failed_containers: usize,
    /// Units aligned to a translation
    pub matched_units: usize,
    /// Translatable units left without a translation
    pub unmatched_units: usize,
    /// Units whose translation was written
    pub applied_units: usize,
    /// Units skipped because the translation was already in place
    pub skipped_units: usize,
    /// Units whose container geometry had to be rolled back
    pub rolled_back_units: usize,
    /// Units whose write failed
    pub failed_units: usize,
    /// Why the job ended `Failed`; `None` when it ended `Done`
    pub failure: Option<JobError>,
}

/// Per-container tally folded into the job summary
#[derive(Debug, Default)]
struct ContainerOutcome {
    cancelled: bool,
    extraction_failed: bool,
    backend_failed: bool,
    matched: usize,
    unmatched: usize,
    applied: usize,
    skipped: usize,
    rolled_back: usize,
    failed_units: usize,
}

impl ContainerOutcome {
    fn succeeded(&self) -> bool {
        !self.cancelled && !self.extraction_failed && !self.backend_failed
    }
}

/// Drives one document job end to end
pub struct Orchestrator {
    backend: Arc<dyn TranslationBackend>,
    config: Config,
    progress: Arc<dyn ProgressSink>,
    renderer: Option<Arc<RendererSupervisor>>,
}

impl Orchestrator {
    /// Orchestrator over a backend and configuration
    pub fn new(backend: Arc<dyn TranslationBackend>, config: Config) -> Self {
        Self { backend, config, progress: Arc::new(LogProgress), renderer: None }
    }

    /// Replace the progress sink
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Attach a renderer to health-check before the job
    pub fn with_renderer(mut self, renderer: Arc<RendererSupervisor>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Run the job against a shared document.
    ///
    /// The document lock is held only for extraction and application, never
    /// across a backend call. A job that ends `Failed` still reports its
    /// tallies; the cause is in `JobSummary::failure`.
    pub async fn run<D: DocumentModel>(
        &self,
        document: Arc<Mutex<D>>,
        cancel: &CancellationFlag,
    ) -> JobSummary {
        let job_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = document.lock().container_count();
        info!("Job {} started: {} containers", job_id, total);
        debug!("Job {} state: {:?} -> {:?}", job_id, JobState::Queued, JobState::Extracting);

        if let Some(renderer) = &self.renderer {
            if let Err(e) = renderer.health_check().await {
                warn!("Job {}: renderer unresponsive ({}), restarting", job_id, e);
                if let Err(e) = renderer.restart().await {
                    warn!("Job {}: renderer restart failed, continuing without: {}", job_id, e);
                }
            }
        }

        if total == 0 {
            return self.summary(job_id, started_at, JobState::Done, None, total, &[]);
        }

        let domain = self.classify_domain(&document, job_id).await;
        let encoder = BatchEncoder::new(&self.config);
        let thresholds = MatchThresholds {
            paragraph: self.config.job.paragraph_match_threshold,
            cell: self.config.job.cell_match_threshold,
        };
        let settings = MutationSettings::from(&self.config.job);
        let semaphore = Arc::new(Semaphore::new(self.config.job.concurrent_requests));

        debug!("Job {} state: {:?} -> {:?}", job_id, JobState::Extracting, JobState::Translating);

        let mut outcomes: Vec<ContainerOutcome> = Vec::with_capacity(total);
        {
            let mut stream = stream::iter(0..total)
                .map(|container| {
                    self.process_container(
                        &document,
                        container,
                        &encoder,
                        domain.as_deref(),
                        &semaphore,
                        cancel,
                        &thresholds,
                        &settings,
                        job_id,
                    )
                })
                .buffer_unordered(self.config.job.concurrent_requests);

            while let Some(outcome) = stream.next().await {
                outcomes.push(outcome);
                self.progress.report(job_id, outcomes.len(), total);
            }
        }

        let (state, failure) = self.conclude(job_id, cancel, total, &outcomes);
        self.summary(job_id, started_at, state, failure, total, &outcomes)
    }

    /// Sample the first container and ask the backend for a domain hint
    async fn classify_domain<D: DocumentModel>(
        &self,
        document: &Arc<Mutex<D>>,
        job_id: Uuid,
    ) -> Option<String> {
        let units = {
            let doc = document.lock();
            self.extract_units(&*doc, 0).ok()?
        };
        let sample = domain_sample(&units);
        if sample.is_empty() {
            return None;
        }
        match self.backend.classify_domain(&sample).await {
            Ok(domain) => {
                debug!("Job {} classified as domain '{}'", job_id, domain);
                Some(domain)
            }
            Err(e) => {
                warn!("Job {}: domain classification failed, proceeding without: {}", job_id, e);
                None
            }
        }
    }

    fn extract_units<D: DocumentModel + ?Sized>(
        &self,
        document: &D,
        container: usize,
    ) -> Result<Vec<TextUnit>, crate::errors::DocumentError> {
        Ok(document
            .list_text_units(container)?
            .into_iter()
            .map(|(location, text)| TextUnit::new(text, location, &self.config.target_language))
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_container<D: DocumentModel>(
        &self,
        document: &Arc<Mutex<D>>,
        container: usize,
        encoder: &BatchEncoder,
        domain: Option<&str>,
        semaphore: &Semaphore,
        cancel: &CancellationFlag,
        thresholds: &MatchThresholds,
        settings: &MutationSettings,
        job_id: Uuid,
    ) -> ContainerOutcome {
        let mut outcome = ContainerOutcome::default();

        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }

        let units = {
            let doc = document.lock();
            match self.extract_units(&*doc, container) {
                Ok(units) => units,
                Err(e) => {
                    warn!("Job {}: container {} unreadable, skipping: {}", job_id, container, e);
                    outcome.extraction_failed = true;
                    return outcome;
                }
            }
        };

        let request = match encoder.encode(container, &units, domain) {
            Ok(request) => request,
            Err(EncodingError::NoTranslatableUnits(_)) => {
                debug!("Job {}: container {} has nothing to translate", job_id, container);
                return outcome;
            }
        };

        let mapping = {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    outcome.backend_failed = true;
                    return outcome;
                }
            };
            match self.backend.translate(&request).await {
                Ok(mapping) => mapping,
                Err(e) => {
                    warn!("Job {}: container {} translation failed: {}", job_id, container, e);
                    outcome.backend_failed = true;
                    return outcome;
                }
            }
        };

        debug!(
            "Job {} container {}: {:?} -> {:?}, {} pairs for {} units",
            job_id,
            container,
            JobState::Translating,
            JobState::Matching,
            mapping.len(),
            units.len()
        );
        let mut used = HashSet::new();
        let matches = match_units(&units, &mapping, &mut used, thresholds);

        debug!(
            "Job {} container {}: {:?} -> {:?}",
            job_id,
            container,
            JobState::Matching,
            JobState::Applying
        );
        let mut doc = document.lock();
        for unit_match in &matches {
            let unit = &units[unit_match.unit_index];
            match (&unit_match.status, &unit_match.result) {
                (MatchStatus::Matched, Some(result)) => {
                    outcome.matched += 1;
                    match apply(
                        &mut *doc,
                        unit,
                        &result.translation,
                        self.config.layout_mode,
                        settings,
                    ) {
                        Ok(ApplyOutcome::Applied) => outcome.applied += 1,
                        Ok(ApplyOutcome::Skipped(_)) => outcome.skipped += 1,
                        Ok(ApplyOutcome::RolledBack) => outcome.rolled_back += 1,
                        Err(e) => {
                            warn!(
                                "Job {}: write failed at {}, original kept: {}",
                                job_id, unit.location, e
                            );
                            outcome.failed_units += 1;
                        }
                    }
                }
                _ => {
                    if unit.is_translatable() {
                        debug!("Job {}: no translation matched {}", job_id, unit.location);
                        outcome.unmatched += 1;
                    }
                }
            }
        }

        outcome
    }

    /// Decide the terminal state and failure cause from the container
    /// outcomes. A failed job still gets a full summary.
    fn conclude(
        &self,
        job_id: Uuid,
        cancel: &CancellationFlag,
        total: usize,
        outcomes: &[ContainerOutcome],
    ) -> (JobState, Option<JobError>) {
        let completed = outcomes.iter().filter(|o| o.succeeded()).count();

        if cancel.is_cancelled() {
            info!("Job {} cancelled after {}/{} containers", job_id, completed, total);
            return (JobState::Failed, Some(JobError::Cancelled { completed, total }));
        }

        let backend_failures = outcomes.iter().filter(|o| o.backend_failed).count();
        if backend_failures == total && total > 0 {
            return (JobState::Failed, Some(JobError::BackendUnreachable(total)));
        }

        let failed = total - completed;
        if failed > 0 {
            warn!(
                "Job {} finished with {} of {} containers untouched",
                job_id, failed, total
            );
        }
        (JobState::Done, None)
    }

    fn summary(
        &self,
        job_id: Uuid,
        started_at: DateTime<Utc>,
        state: JobState,
        failure: Option<JobError>,
        total: usize,
        outcomes: &[ContainerOutcome],
    ) -> JobSummary {
        let summary = JobSummary {
            job_id,
            state,
            started_at,
            finished_at: Utc::now(),
            total_containers: total,
            completed_containers: outcomes.iter().filter(|o| o.succeeded()).count(),
            failed_containers: outcomes.iter().filter(|o| !o.succeeded()).count(),
            matched_units: outcomes.iter().map(|o| o.matched).sum(),
            unmatched_units: outcomes.iter().map(|o| o.unmatched).sum(),
            applied_units: outcomes.iter().map(|o| o.applied).sum(),
            skipped_units: outcomes.iter().map(|o| o.skipped).sum(),
            rolled_back_units: outcomes.iter().map(|o| o.rolled_back).sum(),
            failed_units: outcomes.iter().map(|o| o.failed_units).sum(),
            failure,
        };
        info!(
            "Job {} finished {:?}: {}/{} containers, {} applied, {} skipped, {} unmatched, {} rolled back",
            job_id,
            summary.state,
            summary.completed_containers,
            summary.total_containers,
            summary.applied_units,
            summary.skipped_units,
            summary.unmatched_units,
            summary.rolled_back_units
        );
        summary
    }
}
