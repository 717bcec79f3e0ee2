/*!
 * Common test utilities for the doctrans test suite
 */

use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

use doctrans::app_config::Config;
use doctrans::document::memory::{MemoryContainer, MemoryParagraph, MemoryShape};
use doctrans::document::MemoryDocument;


/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Build a deck where each entry is one container with one text frame
/// holding the given paragraphs
pub fn build_deck(containers: &[&[&str]]) -> MemoryDocument {
    let containers = containers
        .iter()
        .map(|paragraphs| {
            let mut container = MemoryContainer::new();
            container.shapes.push(MemoryShape::TextFrame {
                paragraphs: paragraphs.iter().map(|p| MemoryParagraph::new(*p)).collect(),
            });
            container
        })
        .collect();
    MemoryDocument { containers }
}

/// Build a single-container deck with a text frame and a one-row table
pub fn build_deck_with_table(paragraphs: &[&str], cells: &[&str]) -> MemoryDocument {
    let mut container = MemoryContainer::new();
    container.shapes.push(MemoryShape::TextFrame {
        paragraphs: paragraphs.iter().map(|p| MemoryParagraph::new(*p)).collect(),
    });
    container.shapes.push(MemoryShape::Table {
        rows: vec![cells.iter().map(|c| vec![MemoryParagraph::new(*c)]).collect()],
    });
    MemoryDocument { containers: vec![container] }
}

/// English-to-Chinese config suitable for tests: no renderer, quick retries
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "zh".to_string();
    config.backend.retry_backoff_ms = 10;
    config
}
