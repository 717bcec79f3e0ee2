use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

/// Application configuration module
/// This module handles the engine configuration including loading,
/// validating and saving configuration settings.
/// Represents the engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Bilingual layout mode applied to every unit
    #[serde(default)]
    pub layout_mode: LayoutMode,

    /// Translation backend config
    pub backend: BackendConfig,

    /// Job/concurrency config
    #[serde(default)]
    pub job: JobConfig,

    /// External renderer config
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How the translated text is laid out relative to the original
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Translation only
    #[default]
    Replace,
    /// Original on top, translation below
    OriginalThenTranslation,
    /// Translation on top, original below
    TranslationThenOriginal,
}

impl std::str::FromStr for LayoutMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "replace" | "translation_only" => Ok(Self::Replace),
            "original_then_translation" | "paragraph_up" => Ok(Self::OriginalThenTranslation),
            "translation_then_original" | "paragraph_down" => Ok(Self::TranslationThenOriginal),
            _ => Err(anyhow!("Invalid layout mode: {}", s)),
        }
    }
}

/// Translation backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of retry attempts per request
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff time in milliseconds for exponential backoff
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Terms to leave untranslated
    #[serde(default)]
    pub stop_words: Vec<String>,

    /// Preferred term -> term glossary
    #[serde(default)]
    pub glossary: std::collections::HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            stop_words: Vec::new(),
            glossary: std::collections::HashMap::new(),
        }
    }
}

/// Job orchestration configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobConfig {
    /// Maximum concurrent backend calls per job
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// System-wide cap on simultaneously processed documents
    #[serde(default = "default_admission_cap")]
    pub admission_cap: usize,

    /// Similarity acceptance threshold for paragraph units
    #[serde(default = "default_paragraph_match_threshold")]
    pub paragraph_match_threshold: f32,

    /// Similarity acceptance threshold for table-cell units (tighter)
    #[serde(default = "default_cell_match_threshold")]
    pub cell_match_threshold: f32,

    /// Skip-insertion threshold for paragraph units
    #[serde(default = "default_paragraph_skip_threshold")]
    pub paragraph_skip_threshold: f32,

    /// Skip-insertion threshold for table-cell units
    #[serde(default = "default_cell_skip_threshold")]
    pub cell_skip_threshold: f32,

    /// Maximum geometry drift (layout units) accepted after a fit-flag toggle
    #[serde(default = "default_geometry_tolerance")]
    pub geometry_tolerance: f64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrent_requests(),
            admission_cap: default_admission_cap(),
            paragraph_match_threshold: default_paragraph_match_threshold(),
            cell_match_threshold: default_cell_match_threshold(),
            paragraph_skip_threshold: default_paragraph_skip_threshold(),
            cell_skip_threshold: default_cell_skip_threshold(),
            geometry_tolerance: default_geometry_tolerance(),
        }
    }
}

/// External renderer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RendererConfig {
    /// Whether to invoke the renderer after mutation
    #[serde(default)]
    pub enabled: bool,

    /// Renderer binary (e.g. "soffice")
    #[serde(default = "default_renderer_binary")]
    pub binary: String,

    /// Render invocation timeout in seconds
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            binary: default_renderer_binary(),
            timeout_secs: default_render_timeout_secs(),
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warn level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl LogLevel {
    /// Convert to a log crate filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_model() -> String {
    "qwen-plus".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_concurrent_requests() -> usize {
    3
}

fn default_admission_cap() -> usize {
    10
}

fn default_paragraph_match_threshold() -> f32 {
    0.6
}

fn default_cell_match_threshold() -> f32 {
    0.75
}

fn default_paragraph_skip_threshold() -> f32 {
    0.85
}

fn default_cell_skip_threshold() -> f32 {
    0.9
}

fn default_geometry_tolerance() -> f64 {
    0.5
}

fn default_renderer_binary() -> String {
    "soffice".to_string()
}

fn default_render_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "zh".to_string(),
            layout_mode: LayoutMode::default(),
            backend: BackendConfig::default(),
            job: JobConfig::default(),
            renderer: RendererConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path.as_ref(), e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path.as_ref(), e))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.source_language.is_empty() {
            return Err(anyhow!("Source language must not be empty"));
        }
        if self.target_language.is_empty() {
            return Err(anyhow!("Target language must not be empty"));
        }
        if self.job.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }
        if self.job.admission_cap == 0 {
            return Err(anyhow!("admission_cap must be at least 1"));
        }
        for (name, value) in [
            ("paragraph_match_threshold", self.job.paragraph_match_threshold),
            ("cell_match_threshold", self.job.cell_match_threshold),
            ("paragraph_skip_threshold", self.job.paragraph_skip_threshold),
            ("cell_skip_threshold", self.job.cell_skip_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.job.geometry_tolerance < 0.0 {
            return Err(anyhow!("geometry_tolerance must not be negative"));
        }
        Ok(())
    }
}
