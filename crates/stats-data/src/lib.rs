//! Data layer for the access-log statistics tool.
//!
//! Responsible for reading log lines, matching them against the access-log
//! grammar, aggregating the parsed records in a single pass, and handing the
//! results to the record store and the report writer.

pub mod aggregator;
pub mod analysis;
pub mod parser;
pub mod reader;
pub mod report;
pub mod store;

pub use stats_core as core;
