//! Line source over an access-log file.
//!
//! Lines are read as raw bytes and decoded lossily, so a stray invalid UTF-8
//! sequence only affects the field it appears in. Read failures are fatal and
//! surface as [`StatsError::SourceUnreadable`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use stats_core::error::{Result, StatsError};
use tracing::debug;

// ── Public API ────────────────────────────────────────────────────────────────

/// Open `path` for line-by-line reading.
pub fn open_log(path: &Path) -> Result<LineSource<BufReader<File>>> {
    let file = File::open(path).map_err(|source| StatsError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Opened log source {}", path.display());
    Ok(LineSource::new(BufReader::new(file), path))
}

/// Iterator of lines without their terminators.
///
/// Yields at most one error, after which it is exhausted.
pub struct LineSource<R> {
    reader: R,
    path: PathBuf,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> LineSource<R> {
    /// Wrap any buffered reader; `path` is only used in error messages.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            buf: Vec::new(),
            done: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(Ok(decode_line(&self.buf))),
            Err(source) => {
                self.done = true;
                Some(Err(StatsError::SourceUnreadable {
                    path: self.path.clone(),
                    source,
                }))
            }
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Strip a trailing `\n` or `\r\n` and decode lossily.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
