/*!
 * # doctrans - Translation Alignment & Safe-Mutation Engine
 *
 * A Rust library for translating structured documents (slide decks,
 * paginated documents) in place while preserving layout and formatting.
 *
 * ## How it works
 *
 * - Extract translatable text fragments from each container (page/slide)
 * - Batch them into one backend request per container
 * - Re-align the backend's unordered source/translation pairs onto the
 *   original fragments with a matching cascade (exact, normalized,
 *   weighted similarity)
 * - Mutate the document in place with run-format snapshot/restore and
 *   geometry rollback around the shrink-to-fit toggle
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `classifier`: Decides which fragments are worth translating
 * - `document`: The `DocumentModel` boundary and an in-memory implementation
 * - `translation`: The pipeline core:
 *   - `translation::batch`: Batch encoding of units into requests
 *   - `translation::matching`: Source/translation re-alignment
 *   - `translation::formatting`: Run-format snapshot and restore
 *   - `translation::mutator`: Safe in-place writes with rollback
 *   - `translation::pipeline`: Job orchestration and admission control
 * - `providers`: Translation backend clients (HTTP and mock)
 * - `renderer`: Supervision of the external render process
 * - `diagnostics`: Network probing on backend connection trouble
 * - `errors`: Custom error types for the engine
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

#![allow(clippy::uninlined_format_args)]

pub mod app_config;
pub mod classifier;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod providers;
pub mod renderer;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, LayoutMode};
pub use document::{DocumentModel, MemoryDocument, TextUnit, UnitLocation};
pub use errors::{BackendError, DocumentError, JobError, RenderError};
pub use providers::TranslationBackend;
pub use translation::pipeline::{AdmissionGate, CancellationFlag, JobSummary, Orchestrator};
pub use translation::TranslationMapping;
