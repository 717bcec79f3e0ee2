#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;
use uuid::Uuid;

use doctrans::app_config::{Config, LayoutMode, LogLevel};
use doctrans::providers::openai_compat::OpenAiCompatBackend;
use doctrans::renderer::RendererSupervisor;
use doctrans::translation::pipeline::{
    AdmissionGate, CancellationFlag, Orchestrator, ProgressSink,
};
use doctrans::{MemoryDocument, TranslationBackend};

/// doctrans - translate structured documents in place
///
/// Reads a JSON document, translates its text through a chat-completions
/// backend, and writes the mutated document back out with layout and
/// formatting preserved.
#[derive(Parser, Debug)]
#[command(name = "doctrans")]
#[command(version)]
#[command(about = "Layout-preserving document translation")]
struct CommandLineOptions {
    /// Input document (JSON)
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output path; defaults to <input>.translated.json
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Source language code (e.g. 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g. 'zh')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Bilingual layout: replace, original_then_translation, translation_then_original
    #[arg(short = 'L', long)]
    layout: Option<String>,

    /// Only test the backend connection, then exit
    #[arg(long)]
    test_connection: bool,
}

// Minimal stderr logger with timestamps and level colors
struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(StderrLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} [{}] {}\x1B[0m",
                Self::color_for(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Progress sink driving an indicatif bar
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} containers")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, _job_id: Uuid, completed: usize, total: usize) {
        if self.bar.is_hidden() {
            self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    StderrLogger::init(LevelFilter::Info).map_err(|e| anyhow!("logger init failed: {}", e))?;

    let cli = CommandLineOptions::parse();
    let config = load_config(&cli)?;

    if config.log_level != LogLevel::Info {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let backend = OpenAiCompatBackend::new(&config.backend)
        .map_err(|e| anyhow!("backend setup failed: {}", e))?;

    if cli.test_connection {
        backend.test_connection().await.map_err(|e| anyhow!("connection test failed: {}", e))?;
        info!("Backend at {} is reachable", config.backend.endpoint);
        return Ok(());
    }

    let document = MemoryDocument::from_file(&cli.input_path)
        .with_context(|| format!("failed to open document {:?}", cli.input_path))?;
    let output_path = cli
        .output_path
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input_path));

    let gate = AdmissionGate::new(config.job.admission_cap);
    let _permit = gate.admit().await.map_err(|e| anyhow!("admission failed: {}", e))?;

    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing the current containers");
                cancel.cancel();
            }
        });
    }

    let renderer =
        config.renderer.enabled.then(|| Arc::new(RendererSupervisor::new(&config.renderer)));

    let mut orchestrator = Orchestrator::new(Arc::new(backend), config.clone())
        .with_progress(Arc::new(BarProgress::new()));
    if let Some(renderer) = &renderer {
        orchestrator = orchestrator.with_renderer(Arc::clone(renderer));
    }

    let document = Arc::new(Mutex::new(document));
    let summary = orchestrator.run(Arc::clone(&document), &cancel).await;
    if let Some(failure) = &summary.failure {
        return Err(anyhow!("job failed: {}", failure));
    }

    document
        .lock()
        .save(&output_path)
        .with_context(|| format!("failed to save document {:?}", output_path))?;
    info!(
        "Saved {:?}: {} applied, {} skipped, {} unmatched, {} rolled back",
        output_path,
        summary.applied_units,
        summary.skipped_units,
        summary.unmatched_units,
        summary.rolled_back_units
    );

    if let Some(renderer) = &renderer {
        if let Err(e) = renderer.render(&output_path).await {
            warn!("Render of the translated document failed: {}", e);
        }
    }

    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    input.with_file_name(format!("{}.translated.json", stem))
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = if Path::new(&cli.config_path).exists() {
        Config::from_file(&cli.config_path)
            .with_context(|| format!("failed to load config {}", cli.config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", cli.config_path);
        let config = Config::default();
        config
            .save(&cli.config_path)
            .with_context(|| format!("failed to write default config {}", cli.config_path))?;
        config
    };

    if let Some(source) = &cli.source_language {
        config.source_language = source.clone();
    }
    if let Some(target) = &cli.target_language {
        config.target_language = target.clone();
    }
    if let Some(layout) = &cli.layout {
        config.layout_mode = layout.parse::<LayoutMode>()?;
    }
    config.validate().context("configuration validation failed")?;
    Ok(config)
}
