use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, StatsError};
use crate::models::{FieldSet, ReportFormat};

/// Default report destination, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "parsed_results.txt";

/// Default number of records buffered before the store is flushed.
pub const DEFAULT_BATCH_SIZE: u32 = 500;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Analyze a web-server access log in common or combined log format
#[derive(Parser, Debug, Clone)]
#[command(
    name = "access-stats",
    about = "Analyze a web-server access log in common or combined log format",
    version
)]
pub struct Settings {
    /// Path to the access log file
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Line grammar
    #[arg(long, default_value = "combined", value_parser = ["basic", "combined"])]
    pub grammar: String,

    /// Report destination
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Report format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Append every parsed record to this JSON-Lines file
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Records buffered between store flushes
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub batch_size: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Derived configuration ──────────────────────────────────────────────────────

/// Everything the analysis pipeline needs, free of CLI concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub grammar: FieldSet,
    /// Record store path; `None` disables persistence.
    pub store: Option<PathBuf>,
    pub batch_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grammar: FieldSet::default(),
            store: None,
            batch_size: DEFAULT_BATCH_SIZE as usize,
        }
    }
}

/// Where and how the report is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    pub path: PathBuf,
    pub format: ReportFormat,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Build the pipeline configuration from the parsed arguments.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let grammar = FieldSet::parse(&self.grammar)
            .ok_or_else(|| StatsError::Config(format!("unknown grammar: {}", self.grammar)))?;
        if self.batch_size == 0 {
            return Err(StatsError::Config(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(AnalysisConfig {
            grammar,
            store: self.store.clone(),
            batch_size: self.batch_size as usize,
        })
    }

    /// Build the report destination from the parsed arguments.
    pub fn report_target(&self) -> Result<ReportTarget> {
        let format = ReportFormat::parse(&self.format)
            .ok_or_else(|| StatsError::Config(format!("unknown report format: {}", self.format)))?;
        Ok(ReportTarget {
            path: self.output.clone(),
            format,
        })
    }

    /// The log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
