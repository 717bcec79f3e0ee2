/*!
 * End-to-end document job tests using the mock backend
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::common::{build_deck, build_deck_with_table, test_config};
use doctrans::app_config::RendererConfig;
use doctrans::document::memory::{MemoryContainer, MemoryParagraph, MemoryShape};
use doctrans::document::{DocumentModel, MemoryDocument, UnitLocation};
use doctrans::errors::JobError;
use doctrans::providers::mock::MockBackend;
use doctrans::renderer::RendererSupervisor;
use doctrans::translation::pipeline::{CancellationFlag, JobState, Orchestrator, ProgressSink};

/// Progress sink recording every report
#[derive(Debug, Default)]
struct RecordingSink {
    reports: Mutex<Vec<(usize, usize)>>,
}

impl ProgressSink for RecordingSink {
    fn report(&self, _job_id: Uuid, completed: usize, total: usize) {
        self.reports.lock().push((completed, total));
    }
}

/// Progress sink that cancels the job on its first report
#[derive(Debug)]
struct CancelOnFirstReport {
    cancel: CancellationFlag,
    fired: AtomicBool,
}

impl CancelOnFirstReport {
    fn new(cancel: CancellationFlag) -> Self {
        Self { cancel, fired: AtomicBool::new(false) }
    }
}

impl ProgressSink for CancelOnFirstReport {
    fn report(&self, _job_id: Uuid, _completed: usize, _total: usize) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.cancel.cancel();
        }
    }
}

fn shared(doc: MemoryDocument) -> Arc<Mutex<MemoryDocument>> {
    Arc::new(Mutex::new(doc))
}

#[tokio::test]
async fn test_job_translates_deck_despite_unordered_mapping() {
    let deck = build_deck(&[
        &["Revenue increased by 12%.", "Costs fell"],
        &["Outlook remains strong"],
    ]);
    let backend = MockBackend::reversed();
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config())
        .with_progress(Arc::clone(&sink) as Arc<dyn ProgressSink>);

    let document = shared(deck);
    let summary = orchestrator.run(Arc::clone(&document), &CancellationFlag::new()).await;

    assert_eq!(summary.state, JobState::Done);
    assert!(summary.failure.is_none());
    assert_eq!(summary.completed_containers, 2);
    assert_eq!(summary.matched_units, 3);
    assert_eq!(summary.applied_units, 3);
    assert_eq!(summary.unmatched_units, 0);

    let doc = document.lock();
    assert_eq!(
        doc.read(&UnitLocation::paragraph(0, 0, 0)).unwrap(),
        "译:Revenue increased by 12%."
    );
    assert_eq!(doc.read(&UnitLocation::paragraph(0, 0, 1)).unwrap(), "译:Costs fell");
    assert_eq!(
        doc.read(&UnitLocation::paragraph(1, 0, 0)).unwrap(),
        "译:Outlook remains strong"
    );

    // Progress was reported after each container and ends complete
    let reports = sink.reports.lock();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports.last(), Some(&(2, 2)));
}

#[tokio::test]
async fn test_job_never_writes_non_translatable_units() {
    let deck = build_deck_with_table(&["Revenue grew", "42", "***"], &["Net income", "1,234"]);
    let backend = MockBackend::working();
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config());

    let document = shared(deck);
    let summary = orchestrator.run(Arc::clone(&document), &CancellationFlag::new()).await;

    let doc = document.lock();
    assert_eq!(doc.read(&UnitLocation::paragraph(0, 0, 1)).unwrap(), "42");
    assert_eq!(doc.read(&UnitLocation::paragraph(0, 0, 2)).unwrap(), "***");
    assert_eq!(doc.read(&UnitLocation::table_cell(0, 1, 0, 1, 0)).unwrap(), "1,234");
    // The translatable paragraph and cell were both translated
    assert_eq!(doc.read(&UnitLocation::paragraph(0, 0, 0)).unwrap(), "译:Revenue grew");
    assert_eq!(doc.read(&UnitLocation::table_cell(0, 1, 0, 0, 0)).unwrap(), "译:Net income");
    assert_eq!(summary.matched_units, 2);
    assert_eq!(summary.unmatched_units, 0);
}

#[tokio::test]
async fn test_job_with_nothing_translatable_is_a_quiet_success() {
    let deck = build_deck(&[&["42"], &["----"]]);
    let backend = MockBackend::working();
    let backend_handle = backend.clone();
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config());

    let summary = orchestrator.run(shared(deck), &CancellationFlag::new()).await;

    assert_eq!(summary.state, JobState::Done);
    assert_eq!(summary.completed_containers, 2);
    assert_eq!(summary.applied_units, 0);
    assert_eq!(backend_handle.call_count(), 0);
}

#[tokio::test]
async fn test_backend_concurrency_never_exceeds_cap() {
    let slides: Vec<Vec<&str>> = (0..6).map(|_| vec!["Quarterly revenue grew nicely"]).collect();
    let slide_refs: Vec<&[&str]> = slides.iter().map(|s| s.as_slice()).collect();
    let deck = build_deck(&slide_refs);

    let mut config = test_config();
    config.job.concurrent_requests = 2;
    let backend = MockBackend::slow(30);
    let backend_handle = backend.clone();
    let orchestrator = Orchestrator::new(Arc::new(backend), config);

    let summary = orchestrator.run(shared(deck), &CancellationFlag::new()).await;

    assert_eq!(summary.completed_containers, 6);
    assert!(backend_handle.max_concurrency() <= 2);
    assert_eq!(backend_handle.call_count(), 6);
}

#[tokio::test]
async fn test_partial_success_when_one_container_fails() {
    let deck = build_deck(&[
        &["First slide body"],
        &["Second slide body"],
        &["Third slide body"],
    ]);
    let backend = MockBackend::fail_first(1);
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config())
        .with_progress(Arc::clone(&sink) as Arc<dyn ProgressSink>);

    let document = shared(deck);
    let summary = orchestrator.run(Arc::clone(&document), &CancellationFlag::new()).await;

    assert_eq!(summary.state, JobState::Done);
    assert!(summary.failure.is_none());
    assert_eq!(summary.completed_containers, 2);
    assert_eq!(summary.failed_containers, 1);
    assert_eq!(summary.applied_units, 2);

    // Exactly one container kept its original text
    let doc = document.lock();
    let untouched = (0..3)
        .filter(|c| {
            !doc.read(&UnitLocation::paragraph(*c, 0, 0)).unwrap().starts_with("译:")
        })
        .count();
    assert_eq!(untouched, 1);

    // The failed container still counts toward progress, so the bar closes
    let reports = sink.reports.lock();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports.last(), Some(&(3, 3)));
}

#[tokio::test]
async fn test_precancelled_job_fails_with_nothing_applied() {
    let deck = build_deck(&[&["First slide"], &["Second slide"]]);
    let backend = MockBackend::working();
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config());

    let cancel = CancellationFlag::new();
    cancel.cancel();
    let summary = orchestrator.run(shared(deck), &cancel).await;

    assert_eq!(summary.state, JobState::Failed);
    assert_eq!(summary.failure, Some(JobError::Cancelled { completed: 0, total: 2 }));
    assert_eq!(summary.applied_units, 0);
}

#[tokio::test]
async fn test_cancel_mid_job_finishes_in_flight_container_and_keeps_counts() {
    let deck = build_deck(&[
        &["First slide body"],
        &["Second slide body"],
        &["Third slide body"],
        &["Fourth slide body"],
    ]);
    let mut config = test_config();
    // One container at a time so the cancel lands between containers
    config.job.concurrent_requests = 1;

    let cancel = CancellationFlag::new();
    let backend = MockBackend::slow(20);
    let orchestrator = Orchestrator::new(Arc::new(backend), config)
        .with_progress(Arc::new(CancelOnFirstReport::new(cancel.clone())));

    let document = shared(deck);
    let summary = orchestrator.run(Arc::clone(&document), &cancel).await;

    // The container already in flight ran to completion and its tally survives
    assert_eq!(summary.state, JobState::Failed);
    assert_eq!(summary.failure, Some(JobError::Cancelled { completed: 1, total: 4 }));
    assert_eq!(summary.completed_containers, 1);
    assert_eq!(summary.applied_units, 1);

    let doc = document.lock();
    assert_eq!(doc.read(&UnitLocation::paragraph(0, 0, 0)).unwrap(), "译:First slide body");
    for container in 1..4 {
        assert!(
            !doc.read(&UnitLocation::paragraph(container, 0, 0)).unwrap().starts_with("译:")
        );
    }
}

#[tokio::test]
async fn test_every_container_failing_is_backend_unreachable() {
    let deck = build_deck(&[&["First slide"], &["Second slide"]]);
    let backend = MockBackend::failing();
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config());

    let summary = orchestrator.run(shared(deck), &CancellationFlag::new()).await;

    assert_eq!(summary.state, JobState::Failed);
    assert_eq!(summary.failure, Some(JobError::BackendUnreachable(2)));
    assert_eq!(summary.failed_containers, 2);
}

#[tokio::test]
async fn test_unresponsive_renderer_is_restarted_and_job_continues() {
    let deck = build_deck(&[&["Revenue grew"]]);
    let backend = MockBackend::working();
    let renderer = RendererSupervisor::new(&RendererConfig {
        enabled: true,
        binary: "definitely-not-a-renderer-binary".to_string(),
        timeout_secs: 5,
    });
    let orchestrator =
        Orchestrator::new(Arc::new(backend), test_config()).with_renderer(Arc::new(renderer));

    let document = shared(deck);
    let summary = orchestrator.run(Arc::clone(&document), &CancellationFlag::new()).await;

    // Health check and restart both fail; the translation job is unaffected
    assert_eq!(summary.state, JobState::Done);
    assert_eq!(summary.applied_units, 1);
    assert_eq!(
        document.lock().read(&UnitLocation::paragraph(0, 0, 0)).unwrap(),
        "译:Revenue grew"
    );
}

#[tokio::test]
async fn test_geometry_rollback_is_counted_and_restored() {
    let mut container = MemoryContainer::new();
    container.geometry.width = 5.0;
    container.fit_resize_delta = 0.6;
    container.shapes.push(MemoryShape::TextFrame {
        paragraphs: vec![MemoryParagraph::new("Outlook remains strong")],
    });
    let deck = MemoryDocument { containers: vec![container] };

    let backend = MockBackend::working();
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config());

    let document = shared(deck);
    let summary = orchestrator.run(Arc::clone(&document), &CancellationFlag::new()).await;

    assert_eq!(summary.rolled_back_units, 1);
    let doc = document.lock();
    assert_eq!(doc.snapshot_geometry(0).unwrap().width.to_bits(), 5.0f64.to_bits());
    assert!(!doc.fit_flag(0).unwrap());
    // The translation itself was still written
    assert_eq!(doc.read(&UnitLocation::paragraph(0, 0, 0)).unwrap(), "译:Outlook remains strong");
}

#[tokio::test]
async fn test_translation_already_in_place_is_skipped() {
    let deck = build_deck(&[&["Revenue Grew"]]);
    // Translator that only changes case: close enough to count as present
    let backend = MockBackend::working().with_translator(|s| s.to_lowercase());
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config());

    let document = shared(deck);
    let summary = orchestrator.run(Arc::clone(&document), &CancellationFlag::new()).await;

    assert_eq!(summary.skipped_units, 1);
    assert_eq!(summary.applied_units, 0);
    assert_eq!(document.lock().read(&UnitLocation::paragraph(0, 0, 0)).unwrap(), "Revenue Grew");
}

#[tokio::test]
async fn test_empty_document_finishes_immediately() {
    let deck = MemoryDocument::new();
    let backend = MockBackend::working();
    let orchestrator = Orchestrator::new(Arc::new(backend), test_config());

    let summary = orchestrator.run(shared(deck), &CancellationFlag::new()).await;

    assert_eq!(summary.state, JobState::Done);
    assert_eq!(summary.total_containers, 0);
}
