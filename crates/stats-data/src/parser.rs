//! Access-log line grammar.
//!
//! A [`LineParser`] matches one raw line against the common-log grammar
//! selected by its [`FieldSet`] and either returns a [`LogRecord`] or `None`.
//! Matching is anchored at the start of the line only; whatever follows the
//! last required field is ignored.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use stats_core::models::{FieldSet, LogRecord, RequestDetails};

/// `host ident user [time] "METHOD resource ..." status bytes`
const BASIC_PATTERN: &str = concat!(
    r#"^(?P<remote_host>\S+) \S+ \S+ \[.*?\] "#,
    r#""(?P<method>\S+) (?P<resource>\S+).*?" "#,
    r#"(?P<status_code>[0-9]+) (?P<bytes>[0-9]+|-)"#,
);

/// Basic grammar plus a strict protocol token, referrer and user agent.
const COMBINED_PATTERN: &str = concat!(
    r#"^(?P<remote_host>\S+) \S+ \S+ \[(?P<timestamp>.*?)\] "#,
    r#""(?P<method>\S+) (?P<resource>\S+) (?P<protocol>HTTP/[0-9]\.[0-9])" "#,
    r#"(?P<status_code>[0-9]+) (?P<bytes>[0-9]+|-) "#,
    r#""(?P<referrer>.*?)" "(?P<user_agent>.*?)""#,
);

static BASIC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(BASIC_PATTERN).expect("basic log pattern is valid"));

static COMBINED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(COMBINED_PATTERN).expect("combined log pattern is valid"));

// ── LineParser ────────────────────────────────────────────────────────────────

/// Stateless line matcher for one grammar variant.
#[derive(Debug, Clone, Copy)]
pub struct LineParser {
    field_set: FieldSet,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new(FieldSet::default())
    }
}

impl LineParser {
    pub fn new(field_set: FieldSet) -> Self {
        Self { field_set }
    }

    pub fn field_set(&self) -> FieldSet {
        self.field_set
    }

    /// Match `line` and extract a record.
    ///
    /// Returns `None` for any line that does not fit the grammar. A digit run
    /// too long for its numeric field is treated the same way.
    pub fn parse(&self, line: &str) -> Option<LogRecord> {
        let caps = self.regex().captures(line)?;

        let details = match self.field_set {
            FieldSet::Basic => None,
            FieldSet::Combined => Some(RequestDetails {
                timestamp: group(&caps, "timestamp")?.to_string(),
                method: group(&caps, "method")?.to_string(),
                protocol: group(&caps, "protocol")?.to_string(),
                referrer: group(&caps, "referrer")?.to_string(),
                user_agent: group(&caps, "user_agent")?.to_string(),
            }),
        };

        Some(LogRecord {
            remote_host: group(&caps, "remote_host")?.to_string(),
            resource: group(&caps, "resource")?.to_string(),
            status_code: group(&caps, "status_code")?.parse().ok()?,
            bytes_sent: parse_bytes(group(&caps, "bytes")?)?,
            details,
        })
    }

    fn regex(&self) -> &'static Regex {
        match self.field_set {
            FieldSet::Basic => &BASIC_REGEX,
            FieldSet::Combined => &COMBINED_REGEX,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn group<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str())
}

/// `-` means no body was sent.
fn parse_bytes(raw: &str) -> Option<u64> {
    if raw == "-" {
        Some(0)
    } else {
        raw.parse().ok()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
