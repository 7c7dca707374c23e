//! Shared domain types, errors, settings and formatting helpers for the
//! access-log statistics tool.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{Result, StatsError};
