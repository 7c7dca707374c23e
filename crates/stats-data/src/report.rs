//! Report rendering and writing.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use stats_core::error::{Result, StatsError};
use stats_core::formatting::format_percent;
use stats_core::models::{ReportFormat, Summary};
use stats_core::settings::ReportTarget;
use tracing::info;

use crate::analysis::AnalysisMetadata;

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a Summary,
    metadata: &'a AnalysisMetadata,
}

/// Plain-text report, one statistic per line.
pub fn render_text(summary: &Summary) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Total requests: {}", summary.total_requests);
    let _ = writeln!(
        out,
        "Total data transmitted: {} bytes",
        summary.total_bytes
    );
    let _ = writeln!(
        out,
        "Most requested resource: {} ({} requests, {})",
        summary.top_resource.value,
        summary.top_resource.count,
        format_percent(summary.top_resource.share)
    );
    let _ = writeln!(
        out,
        "Remote host with most requests: {} ({} requests, {})",
        summary.top_host.value,
        summary.top_host.count,
        format_percent(summary.top_host.share)
    );
    let _ = writeln!(out, "Status code distribution:");
    for share in &summary.status_distribution {
        let _ = writeln!(
            out,
            "  {}: {}",
            share.class.label(),
            format_percent(share.percentage)
        );
    }
    out
}

/// Pretty-printed JSON holding the summary and run metadata.
pub fn render_json(summary: &Summary, metadata: &AnalysisMetadata) -> Result<String> {
    let mut json = serde_json::to_string_pretty(&JsonReport { summary, metadata })?;
    json.push('\n');
    Ok(json)
}

/// Render in `target.format` and write to `target.path`.
///
/// The file is written next to its destination and renamed into place, so a
/// failed run never leaves a half-written report.
pub fn write_report(
    target: &ReportTarget,
    summary: &Summary,
    metadata: &AnalysisMetadata,
) -> Result<()> {
    let body = match target.format {
        ReportFormat::Text => render_text(summary),
        ReportFormat::Json => render_json(summary, metadata)?,
    };
    write_atomic(&target.path, &body).map_err(|source| StatsError::Report {
        path: target.path.clone(),
        source,
    })?;
    info!("Analysis saved to {}", target.path.display());
    Ok(())
}

fn write_atomic(path: &Path, body: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);
    std::fs::write(tmp, body)?;
    std::fs::rename(tmp, path)
}
