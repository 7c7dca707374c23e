mod bootstrap;

use anyhow::Result;
use clap::Parser;
use stats_core::error::StatsError;
use stats_core::formatting::format_count;
use stats_core::settings::Settings;
use stats_data::analysis::analyze_file;
use stats_data::report::write_report;

/// How a run ended when it did not fail.
#[derive(Debug, PartialEq, Eq)]
enum RunStatus {
    Reported,
    NoEntries,
}

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;
    tracing::info!("access-stats v{} starting", env!("CARGO_PKG_VERSION"));

    run(&settings)?;
    Ok(())
}

fn run(settings: &Settings) -> Result<RunStatus> {
    let config = settings.analysis_config()?;
    let target = settings.report_target()?;

    let result = analyze_file(&settings.file, &config)?;

    let summary = match result.require_summary() {
        Ok(summary) => summary,
        Err(StatsError::EmptyResult) => {
            println!("No valid log entries found.");
            return Ok(RunStatus::NoEntries);
        }
        Err(e) => return Err(e.into()),
    };

    write_report(&target, summary, &result.metadata)?;

    println!(
        "Analyzed {} requests ({} lines skipped)",
        format_count(summary.total_requests),
        format_count(result.metadata.lines_rejected)
    );
    println!("Analysis saved to {}", target.path.display());
    if let Some(store) = &config.store {
        println!("Records saved to {}", store.display());
    }

    Ok(RunStatus::Reported)
}
