/*!
 * Run-format preservation.
 *
 * Replacing a paragraph's text through a document object model usually
 * resets the run formatting to defaults. The mutator snapshots the format
 * before writing and restores it after. Restore is best-effort per
 * attribute: an attribute the model cannot express back is skipped without
 * failing the unit.
 */

use log::debug;

use crate::document::{ColorValue, DocumentModel, RunFormat, UnitLocation};
use crate::errors::DocumentError;

/// Captured formatting for one unit, taken immediately before a write
#[derive(Debug, Clone)]
pub struct FormatSnapshot {
    location: UnitLocation,
    format: RunFormat,
}

impl FormatSnapshot {
    /// Capture the current run format at `location`
    pub fn capture<D: DocumentModel + ?Sized>(
        document: &D,
        location: &UnitLocation,
    ) -> Result<Self, DocumentError> {
        Ok(Self { location: *location, format: document.read_run_format(location)? })
    }

    /// The captured format
    pub fn format(&self) -> &RunFormat {
        &self.format
    }

    /// Write the captured attributes back, skipping any the model cannot
    /// express. Returns how many attributes were restored.
    pub fn restore<D: DocumentModel + ?Sized>(
        &self,
        document: &mut D,
    ) -> Result<usize, DocumentError> {
        let mut restorable = RunFormat::default();
        let mut count = 0;

        match self.format.color {
            Some(ColorValue::Unsupported) => {
                debug!("Skipping unsupported color kind at {}", self.location);
            }
            Some(color) => {
                restorable.color = Some(color);
                count += 1;
            }
            None => {}
        }
        if let Some(name) = &self.format.font_name {
            restorable.font_name = Some(name.clone());
            count += 1;
        }
        if let Some(size) = self.format.font_size {
            restorable.font_size = Some(size);
            count += 1;
        }
        if let Some(bold) = self.format.bold {
            restorable.bold = Some(bold);
            count += 1;
        }
        if let Some(italic) = self.format.italic {
            restorable.italic = Some(italic);
            count += 1;
        }
        if let Some(underline) = self.format.underline {
            restorable.underline = Some(underline);
            count += 1;
        }

        if count > 0 {
            document.write_run_format(&self.location, &restorable)?;
        }
        Ok(count)
    }
}
