/*!
 * In-place document mutation.
 *
 * Applies a matched translation to its unit through the document model.
 * Every write is bracketed by a format snapshot/restore, and the shrink-to-
 * fit toggle is bracketed by a geometry snapshot with rollback when the
 * container deforms beyond tolerance. The mutator edits the live document;
 * there is no working copy.
 */

use log::{debug, warn};

use crate::app_config::{JobConfig, LayoutMode};
use crate::classifier::clean_control_chars;
use crate::document::{DocumentModel, TextUnit, UnitKind};
use crate::errors::DocumentError;

use super::formatting::FormatSnapshot;
use super::matching::insertion_similarity;

/// Why a unit was left as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipCause {
    /// Translation is byte-identical to the current text
    Identical,
    /// Current text is already close enough to the translation
    AlreadyTranslated,
}

/// What happened to one unit during the apply phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Translation written, format restored
    Applied,
    /// Nothing written
    Skipped(SkipCause),
    /// Translation written but the fit toggle deformed the container;
    /// geometry and fit flag were restored
    RolledBack,
}

/// Tunables for the apply phase, taken from `JobConfig`
#[derive(Debug, Clone, Copy)]
pub struct MutationSettings {
    /// Skip-insertion similarity threshold for paragraphs
    pub paragraph_skip_threshold: f32,
    /// Skip-insertion similarity threshold for table cells
    pub cell_skip_threshold: f32,
    /// Maximum accepted geometry drift after a fit toggle, in layout units
    pub geometry_tolerance: f64,
}

impl Default for MutationSettings {
    fn default() -> Self {
        Self::from(&JobConfig::default())
    }
}

impl From<&JobConfig> for MutationSettings {
    fn from(job: &JobConfig) -> Self {
        Self {
            paragraph_skip_threshold: job.paragraph_skip_threshold,
            cell_skip_threshold: job.cell_skip_threshold,
            geometry_tolerance: job.geometry_tolerance,
        }
    }
}

impl MutationSettings {
    fn skip_threshold(&self, kind: UnitKind) -> f32 {
        match kind {
            UnitKind::Paragraph => self.paragraph_skip_threshold,
            UnitKind::TableCell => self.cell_skip_threshold,
        }
    }
}

/// Compose the text to write for the configured bilingual layout
fn compose(original: &str, translation: &str, mode: LayoutMode) -> String {
    match mode {
        LayoutMode::Replace => translation.to_string(),
        LayoutMode::OriginalThenTranslation => format!("{}\n{}", original, translation),
        LayoutMode::TranslationThenOriginal => format!("{}\n{}", translation, original),
    }
}

/// Apply one matched translation to its unit.
///
/// Reads the current text fresh from the document so a unit that was
/// already translated in an earlier run is detected and skipped. The fit
/// toggle only runs for non-composite containers and only when the flag is
/// currently off.
pub fn apply<D: DocumentModel + ?Sized>(
    document: &mut D,
    unit: &TextUnit,
    translation: &str,
    mode: LayoutMode,
    settings: &MutationSettings,
) -> Result<ApplyOutcome, DocumentError> {
    let translation = clean_control_chars(translation);
    let current = document.read(&unit.location)?;

    if current == translation {
        debug!("Unit at {} already holds the translation", unit.location);
        return Ok(ApplyOutcome::Skipped(SkipCause::Identical));
    }
    let kind = unit.location.kind();
    if insertion_similarity(&current, &translation) >= settings.skip_threshold(kind) {
        debug!("Unit at {} is close enough to the translation, skipping", unit.location);
        return Ok(ApplyOutcome::Skipped(SkipCause::AlreadyTranslated));
    }

    let new_text = compose(&current, &translation, mode);

    let snapshot = FormatSnapshot::capture(document, &unit.location)?;
    document.write(&unit.location, &new_text)?;
    snapshot.restore(document)?;

    fit_container(document, unit.location.container, settings)
}

/// Toggle shrink-to-fit on the unit's container with geometry rollback.
fn fit_container<D: DocumentModel + ?Sized>(
    document: &mut D,
    container: usize,
    settings: &MutationSettings,
) -> Result<ApplyOutcome, DocumentError> {
    if document.is_composite(container)? {
        return Ok(ApplyOutcome::Applied);
    }
    if document.fit_flag(container)? {
        return Ok(ApplyOutcome::Applied);
    }

    let before = document.snapshot_geometry(container)?;
    document.set_fit_flag(container, true)?;
    let after = document.snapshot_geometry(container)?;

    if after.deformed_beyond(&before, settings.geometry_tolerance) {
        warn!(
            "Fit toggle deformed container {} beyond {} units, rolling back",
            container, settings.geometry_tolerance
        );
        document.restore_geometry(container, &before)?;
        document.set_fit_flag(container, false)?;
        return Ok(ApplyOutcome::RolledBack);
    }

    Ok(ApplyOutcome::Applied)
}
