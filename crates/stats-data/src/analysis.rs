//! Main analysis pipeline.
//!
//! Streams lines from a source through the [`LineParser`], hands each record
//! to a [`RecordSink`] and the [`Aggregator`], and finalizes the summary once
//! the source is exhausted.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use stats_core::error::{Result, StatsError};
use stats_core::models::{FieldSet, Summary};
use stats_core::settings::AnalysisConfig;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::parser::LineParser;
use crate::reader::open_log;
use crate::store::{JsonlStore, NullSink, RecordSink};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    /// Grammar the lines were matched against.
    pub grammar: FieldSet,
    /// Lines pulled from the source, including rejected ones.
    pub lines_read: u64,
    /// Lines that matched the grammar.
    pub records_parsed: u64,
    /// Lines that did not match.
    pub lines_rejected: u64,
    /// Wall-clock seconds spent in the pass.
    pub elapsed_seconds: f64,
}

/// The complete output of one pass.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// `None` when no line matched the grammar.
    pub summary: Option<Summary>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// The summary, or [`StatsError::EmptyResult`] when nothing matched.
    pub fn require_summary(&self) -> Result<&Summary> {
        self.summary.as_ref().ok_or(StatsError::EmptyResult)
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run one pass over `lines`.
///
/// Unmatched lines are skipped. The first source or sink error aborts the
/// pass; the sink is flushed before a successful return.
pub fn analyze_lines<I>(
    lines: I,
    parser: &LineParser,
    sink: &mut dyn RecordSink,
) -> Result<AnalysisResult>
where
    I: IntoIterator<Item = Result<String>>,
{
    let start = Instant::now();
    let mut aggregator = Aggregator::new();
    let mut lines_read = 0u64;

    for line in lines {
        let line = line?;
        lines_read += 1;
        if let Some(record) = parser.parse(&line) {
            sink.accept(&record)?;
            aggregator.add_record(&record);
        }
    }
    sink.flush()?;

    let records_parsed = aggregator.total_requests();
    let lines_rejected = lines_read - records_parsed;
    debug!(
        "{} lines read, {} parsed, {} rejected",
        lines_read, records_parsed, lines_rejected
    );

    let summary = match aggregator.finalize() {
        Ok(summary) => Some(summary),
        Err(StatsError::EmptyResult) => {
            warn!("No line matched the {:?} grammar", parser.field_set());
            None
        }
        Err(e) => return Err(e),
    };

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        grammar: parser.field_set(),
        lines_read,
        records_parsed,
        lines_rejected,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };

    Ok(AnalysisResult { summary, metadata })
}

/// Open `path` and run one pass configured by `config`.
///
/// When `config.store` is set, every parsed record is appended to that
/// JSON-Lines file.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisResult> {
    info!("Analyzing {} ({:?} grammar)", path.display(), config.grammar);

    let source = open_log(path)?;
    let parser = LineParser::new(config.grammar);

    let result = match &config.store {
        Some(store_path) => {
            let mut store = JsonlStore::open(store_path, config.batch_size)?;
            let result = analyze_lines(source, &parser, &mut store)?;
            info!(
                "Stored {} records in {}",
                store.written(),
                store_path.display()
            );
            result
        }
        None => analyze_lines(source, &parser, &mut NullSink)?,
    };

    info!(
        "Parsed {} of {} lines in {:.3}s",
        result.metadata.records_parsed, result.metadata.lines_read, result.metadata.elapsed_seconds
    );
    Ok(result)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
