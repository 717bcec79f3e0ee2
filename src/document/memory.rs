/*!
 * In-memory document model.
 *
 * A serde-backed implementation of `DocumentModel` used by the CLI (JSON
 * documents on disk) and by the test suite. It reproduces the two awkward
 * behaviors of real document object models that the engine is built around:
 * writing a paragraph discards its run formatting, and toggling the fit
 * flag may resize the container.
 */

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::DocumentError;

use super::{DocumentModel, Geometry, RunFormat, UnitLocation};

/// One paragraph of text with the formatting of its first run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryParagraph {
    /// Paragraph text
    pub text: String,
    /// First-run formatting
    #[serde(default)]
    pub format: RunFormat,
}

impl MemoryParagraph {
    /// Paragraph with default formatting
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: RunFormat::default() }
    }
}

/// A shape is either a text frame or a table of cells
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryShape {
    /// Plain text frame
    TextFrame {
        /// Paragraphs in order
        paragraphs: Vec<MemoryParagraph>,
    },
    /// Table; rows of cells, each cell holding paragraphs
    Table {
        /// Row-major cells
        rows: Vec<Vec<Vec<MemoryParagraph>>>,
    },
}

/// One container (page/slide)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryContainer {
    /// Shapes in z-order
    pub shapes: Vec<MemoryShape>,
    /// Container geometry
    pub geometry: Geometry,
    /// Shrink-text-to-fit flag
    #[serde(default)]
    pub fit_flag: bool,
    /// Whether this container is a group/composite shape tree
    #[serde(default)]
    pub composite: bool,
    /// Simulated resize applied to width/height when the fit flag is turned
    /// on, mimicking the autofit side effect of real document models
    #[serde(default)]
    pub fit_resize_delta: f64,
}

impl MemoryContainer {
    /// Container with default geometry and no shapes
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            geometry: Geometry { width: 10.0, height: 7.5, left: 0.0, top: 0.0, rotation: 0.0 },
            fit_flag: false,
            composite: false,
            fit_resize_delta: 0.0,
        }
    }
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Containers in document order
    pub containers: Vec<MemoryContainer>,
}

impl MemoryDocument {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DocumentError::OpenFailed {
                path: path.as_ref().display().to_string(),
                reason: e.to_string(),
            }
        })?;
        serde_json::from_str(&content).map_err(|e| DocumentError::OpenFailed {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Save the document to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| DocumentError::WriteFailed {
            location: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(path.as_ref(), content).map_err(|e| DocumentError::WriteFailed {
            location: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })
    }

    fn container(&self, index: usize) -> Result<&MemoryContainer, DocumentError> {
        self.containers.get(index).ok_or(DocumentError::ContainerUnreadable(index))
    }

    fn container_mut(&mut self, index: usize) -> Result<&mut MemoryContainer, DocumentError> {
        self.containers.get_mut(index).ok_or(DocumentError::ContainerUnreadable(index))
    }

    fn paragraph(&self, location: &UnitLocation) -> Result<&MemoryParagraph, DocumentError> {
        let container = self.container(location.container)?;
        let shape = container
            .shapes
            .get(location.shape)
            .ok_or_else(|| DocumentError::LocationOutOfRange(location.to_string()))?;
        let paragraphs = match (shape, location.cell) {
            (MemoryShape::TextFrame { paragraphs }, None) => paragraphs,
            (MemoryShape::Table { rows }, Some((row, col))) => rows
                .get(row)
                .and_then(|r| r.get(col))
                .ok_or_else(|| DocumentError::LocationOutOfRange(location.to_string()))?,
            _ => return Err(DocumentError::LocationOutOfRange(location.to_string())),
        };
        paragraphs
            .get(location.paragraph)
            .ok_or_else(|| DocumentError::LocationOutOfRange(location.to_string()))
    }

    fn paragraph_mut(&mut self, location: &UnitLocation) -> Result<&mut MemoryParagraph, DocumentError> {
        let loc_str = location.to_string();
        let container = self.container_mut(location.container)?;
        let shape = container
            .shapes
            .get_mut(location.shape)
            .ok_or_else(|| DocumentError::LocationOutOfRange(loc_str.clone()))?;
        let paragraphs = match (shape, location.cell) {
            (MemoryShape::TextFrame { paragraphs }, None) => paragraphs,
            (MemoryShape::Table { rows }, Some((row, col))) => rows
                .get_mut(row)
                .and_then(|r| r.get_mut(col))
                .ok_or_else(|| DocumentError::LocationOutOfRange(loc_str.clone()))?,
            _ => return Err(DocumentError::LocationOutOfRange(loc_str)),
        };
        paragraphs
            .get_mut(location.paragraph)
            .ok_or(DocumentError::LocationOutOfRange(loc_str))
    }
}

impl DocumentModel for MemoryDocument {
    fn container_count(&self) -> usize {
        self.containers.len()
    }

    fn is_composite(&self, container: usize) -> Result<bool, DocumentError> {
        Ok(self.container(container)?.composite)
    }

    fn list_text_units(&self, container: usize) -> Result<Vec<(UnitLocation, String)>, DocumentError> {
        let c = self.container(container)?;
        let mut units = Vec::new();
        for (shape_idx, shape) in c.shapes.iter().enumerate() {
            match shape {
                MemoryShape::TextFrame { paragraphs } => {
                    for (para_idx, para) in paragraphs.iter().enumerate() {
                        if !para.text.trim().is_empty() {
                            units.push((
                                UnitLocation::paragraph(container, shape_idx, para_idx),
                                para.text.clone(),
                            ));
                        }
                    }
                }
                MemoryShape::Table { rows } => {
                    for (row_idx, row) in rows.iter().enumerate() {
                        for (col_idx, cell) in row.iter().enumerate() {
                            for (para_idx, para) in cell.iter().enumerate() {
                                if !para.text.trim().is_empty() {
                                    units.push((
                                        UnitLocation::table_cell(
                                            container, shape_idx, row_idx, col_idx, para_idx,
                                        ),
                                        para.text.clone(),
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(units)
    }

    fn read(&self, location: &UnitLocation) -> Result<String, DocumentError> {
        Ok(self.paragraph(location)?.text.clone())
    }

    fn write(&mut self, location: &UnitLocation, text: &str) -> Result<(), DocumentError> {
        let para = self.paragraph_mut(location)?;
        para.text = text.to_string();
        // Real document models drop run formatting when the paragraph text
        // is replaced; reproduce that so snapshot/restore is exercised.
        para.format = RunFormat::default();
        Ok(())
    }

    fn read_run_format(&self, location: &UnitLocation) -> Result<RunFormat, DocumentError> {
        Ok(self.paragraph(location)?.format.clone())
    }

    fn write_run_format(&mut self, location: &UnitLocation, format: &RunFormat) -> Result<(), DocumentError> {
        self.paragraph_mut(location)?.format = format.clone();
        Ok(())
    }

    fn snapshot_geometry(&self, container: usize) -> Result<Geometry, DocumentError> {
        Ok(self.container(container)?.geometry)
    }

    fn restore_geometry(&mut self, container: usize, snapshot: &Geometry) -> Result<(), DocumentError> {
        self.container_mut(container)?.geometry = *snapshot;
        Ok(())
    }

    fn fit_flag(&self, container: usize) -> Result<bool, DocumentError> {
        Ok(self.container(container)?.fit_flag)
    }

    fn set_fit_flag(&mut self, container: usize, value: bool) -> Result<(), DocumentError> {
        let c = self.container_mut(container)?;
        if value && !c.fit_flag && c.fit_resize_delta != 0.0 {
            c.geometry.width += c.fit_resize_delta;
            c.geometry.height += c.fit_resize_delta;
        }
        c.fit_flag = value;
        Ok(())
    }
}
