/*!
 * Document-model collaborator boundary.
 *
 * The engine never parses a document container format itself. Everything it
 * needs from the document goes through the `DocumentModel` trait: listing
 * containers (pages/slides), enumerating text units, reading and writing
 * unit text, and snapshotting run formatting and container geometry around
 * mutations.
 *
 * `memory` provides a serde-backed in-memory implementation used by the CLI
 * and the test suite.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classifier::Classification;
use crate::errors::DocumentError;

pub mod memory;

pub use memory::MemoryDocument;

/// Structural position of a text unit inside the document's container tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitLocation {
    /// Container (page/slide) index
    pub container: usize,
    /// Shape index within the container
    pub shape: usize,
    /// Paragraph index within the shape or cell
    pub paragraph: usize,
    /// Grid cell coordinate when the unit lives in a table
    pub cell: Option<(usize, usize)>,
}

impl UnitLocation {
    /// Location of a plain paragraph unit
    pub fn paragraph(container: usize, shape: usize, paragraph: usize) -> Self {
        Self { container, shape, paragraph, cell: None }
    }

    /// Location of a table-cell unit
    pub fn table_cell(container: usize, shape: usize, row: usize, col: usize, paragraph: usize) -> Self {
        Self { container, shape, paragraph, cell: Some((row, col)) }
    }

    /// Kind of unit this location points at
    pub fn kind(&self) -> UnitKind {
        if self.cell.is_some() { UnitKind::TableCell } else { UnitKind::Paragraph }
    }
}

impl fmt::Display for UnitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell {
            Some((row, col)) => write!(
                f,
                "container {} shape {} cell ({},{}) paragraph {}",
                self.container, self.shape, row, col, self.paragraph
            ),
            None => write!(
                f,
                "container {} shape {} paragraph {}",
                self.container, self.shape, self.paragraph
            ),
        }
    }
}

/// Tagged unit kind, handled exhaustively at the mutator boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Free-text paragraph in a text frame
    Paragraph,
    /// Paragraph inside a table cell
    TableCell,
}

/// A minimal translatable fragment at a specific structural position.
/// Created once per extraction pass and immutable until mutation.
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// Fragment text as read from the document
    pub content: String,
    /// Where the fragment lives
    pub location: UnitLocation,
    /// Classifier verdict for this fragment
    pub classification: Classification,
    /// Character length of the content
    pub length: usize,
}

impl TextUnit {
    /// Build a unit from content and location, classifying it for the target language
    pub fn new(content: String, location: UnitLocation, target_lang: &str) -> Self {
        let classification = crate::classifier::classify(&content, target_lang);
        let length = content.chars().count();
        Self { content, location, classification, length }
    }

    /// Whether the classifier accepted this unit for translation
    pub fn is_translatable(&self) -> bool {
        self.classification.is_translatable()
    }
}

/// Container geometry captured around a layout-affecting mutation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Width in layout units
    pub width: f64,
    /// Height in layout units
    pub height: f64,
    /// Left offset in layout units
    pub left: f64,
    /// Top offset in layout units
    pub top: f64,
    /// Rotation in degrees
    pub rotation: f64,
}

impl Geometry {
    /// Whether any positional axis drifted beyond `tolerance` relative to `other`.
    /// Rotation is restored but not part of the deformation check.
    pub fn deformed_beyond(&self, other: &Geometry, tolerance: f64) -> bool {
        (self.width - other.width).abs() > tolerance
            || (self.height - other.height).abs() > tolerance
            || (self.left - other.left).abs() > tolerance
            || (self.top - other.top).abs() > tolerance
    }
}

/// Color kinds a run can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorValue {
    /// Explicit RGB color
    Rgb(u8, u8, u8),
    /// Theme palette slot
    Theme(u8),
    /// A kind the document model could not express; restore skips it
    Unsupported,
}

/// Run-level formatting attributes captured before a text write
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunFormat {
    /// Font color, when set
    pub color: Option<ColorValue>,
    /// Font family name
    pub font_name: Option<String>,
    /// Font size in points
    pub font_size: Option<f32>,
    /// Bold flag
    pub bold: Option<bool>,
    /// Italic flag
    pub italic: Option<bool>,
    /// Underline flag
    pub underline: Option<bool>,
}

/// Interface the engine requires from a document container implementation.
///
/// All geometry values are in the document's own layout units; the engine
/// only compares them against the configured deformation tolerance.
pub trait DocumentModel: Send {
    /// Number of containers (pages/slides) in the document
    fn container_count(&self) -> usize;

    /// Whether the container is a group/composite shape tree. Composite
    /// containers are excluded from fit-flag toggles entirely.
    fn is_composite(&self, container: usize) -> Result<bool, DocumentError>;

    /// Enumerate unit locations and their raw text, in extraction order
    fn list_text_units(&self, container: usize) -> Result<Vec<(UnitLocation, String)>, DocumentError>;

    /// Read the current text of a unit
    fn read(&self, location: &UnitLocation) -> Result<String, DocumentError>;

    /// Replace the text of a unit's paragraph. On most document object
    /// models this discards run formatting, which is why callers snapshot
    /// formats first.
    fn write(&mut self, location: &UnitLocation, text: &str) -> Result<(), DocumentError>;

    /// Read the formatting of the unit's first run
    fn read_run_format(&self, location: &UnitLocation) -> Result<RunFormat, DocumentError>;

    /// Write formatting onto the unit's first run
    fn write_run_format(&mut self, location: &UnitLocation, format: &RunFormat) -> Result<(), DocumentError>;

    /// Capture container geometry
    fn snapshot_geometry(&self, container: usize) -> Result<Geometry, DocumentError>;

    /// Restore container geometry from a snapshot
    fn restore_geometry(&mut self, container: usize, snapshot: &Geometry) -> Result<(), DocumentError>;

    /// Current shrink-text-to-fit flag of the container
    fn fit_flag(&self, container: usize) -> Result<bool, DocumentError>;

    /// Toggle the shrink-text-to-fit flag. The document model may resize
    /// the container as a side effect; the mutator checks and rolls back.
    fn set_fit_flag(&mut self, container: usize, value: bool) -> Result<(), DocumentError>;
}
