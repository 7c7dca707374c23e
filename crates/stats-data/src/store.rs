//! Record persistence.
//!
//! The pipeline hands every parsed record to a [`RecordSink`] one at a time.
//! [`JsonlStore`] buffers serialized records and appends them to a JSON-Lines
//! file in batches, so storage cost stays off the per-record path.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use stats_core::error::{Result, StatsError};
use stats_core::models::LogRecord;
use tracing::debug;

// ── RecordSink ────────────────────────────────────────────────────────────────

/// Destination for individually handed-off records.
pub trait RecordSink {
    /// Accept one record. Implementations may buffer it.
    fn accept(&mut self, record: &LogRecord) -> Result<()>;

    /// Persist anything still buffered.
    fn flush(&mut self) -> Result<()>;
}

/// Sink that discards everything; used when storage is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn accept(&mut self, _record: &LogRecord) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink, handy for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct VecSink {
    pub records: Vec<LogRecord>,
}

impl RecordSink for VecSink {
    fn accept(&mut self, record: &LogRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

// ── JsonlStore ────────────────────────────────────────────────────────────────

/// Append-only JSON-Lines record store.
///
/// Each line holds one record: `remote_host`, `resource`, `status_code`,
/// `bytes_sent`, plus `timestamp`, `method`, `protocol`, `referrer` and
/// `user_agent` for records parsed with the combined grammar.
pub struct JsonlStore {
    path: PathBuf,
    file: File,
    buffer: Vec<u8>,
    pending: usize,
    batch_size: usize,
    written: u64,
}

impl JsonlStore {
    /// Open (or create) the store at `path`, creating parent directories.
    ///
    /// A `batch_size` of `0` is treated as `1`.
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        let sink_err = |source: std::io::Error| StatsError::Sink {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(sink_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(sink_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            buffer: Vec::new(),
            pending: 0,
            batch_size: batch_size.max(1),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written to disk so far, excluding any still buffered.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn write_batch(&mut self) -> Result<()> {
        if self.pending == 0 {
            return Ok(());
        }
        self.file
            .write_all(&self.buffer)
            .and_then(|_| self.file.flush())
            .map_err(|source| StatsError::Sink {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            "Stored batch of {} records in {}",
            self.pending,
            self.path.display()
        );
        self.written += self.pending as u64;
        self.pending = 0;
        self.buffer.clear();
        Ok(())
    }
}

impl RecordSink for JsonlStore {
    fn accept(&mut self, record: &LogRecord) -> Result<()> {
        serde_json::to_writer(&mut self.buffer, record)?;
        self.buffer.push(b'\n');
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.write_batch()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.write_batch()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
