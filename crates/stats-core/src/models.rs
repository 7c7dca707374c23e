use serde::{Deserialize, Serialize};

/// Which log-line grammar the parser applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSet {
    /// Host, request, status and size only; anything may follow the size.
    Basic,
    /// Full combined format, also capturing timestamp, protocol, referrer
    /// and user agent.
    #[default]
    Combined,
}

impl FieldSet {
    /// Parse a field-set name (`"basic"` or `"combined"`, case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "basic" | "common" => Some(FieldSet::Basic),
            "combined" => Some(FieldSet::Combined),
            _ => None,
        }
    }
}

/// Output format of the written report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Request-line and trailer fields captured only by the combined grammar.
///
/// All values are kept verbatim; the timestamp is not parsed into a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDetails {
    /// Bracketed timestamp text, without the brackets.
    pub timestamp: String,
    /// HTTP method token, e.g. `GET`.
    pub method: String,
    /// Protocol token of the shape `HTTP/<digit>.<digit>`.
    pub protocol: String,
    /// Referrer header value, `-` when the client sent none.
    pub referrer: String,
    /// User-agent header value.
    pub user_agent: String,
}

/// A single validated access-log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Client host or address token.
    pub remote_host: String,
    /// Requested path or URI token.
    pub resource: String,
    /// HTTP status code. Only the digit shape is checked, not the range.
    pub status_code: u16,
    /// Response body size; a `-` in the log maps to `0`.
    pub bytes_sent: u64,
    /// Present when the line was parsed with the combined grammar.
    #[serde(flatten)]
    pub details: Option<RequestDetails>,
}

impl LogRecord {
    /// The leading digit of the status code (`status_code / 100`).
    pub fn status_class(&self) -> u16 {
        self.status_code / 100
    }
}

/// The five HTTP status classes reported in every summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// All classes in ascending order, 1xx through 5xx.
    pub const ALL: [StatusClass; 5] = [
        StatusClass::Informational,
        StatusClass::Success,
        StatusClass::Redirection,
        StatusClass::ClientError,
        StatusClass::ServerError,
    ];

    /// Map a class digit to a class. Returns `None` outside `1..=5`.
    pub fn from_digit(digit: u16) -> Option<Self> {
        match digit {
            1 => Some(StatusClass::Informational),
            2 => Some(StatusClass::Success),
            3 => Some(StatusClass::Redirection),
            4 => Some(StatusClass::ClientError),
            5 => Some(StatusClass::ServerError),
            _ => None,
        }
    }

    pub fn digit(self) -> u16 {
        match self {
            StatusClass::Informational => 1,
            StatusClass::Success => 2,
            StatusClass::Redirection => 3,
            StatusClass::ClientError => 4,
            StatusClass::ServerError => 5,
        }
    }

    /// Short label such as `"4xx"`.
    pub fn label(self) -> String {
        format!("{}xx", self.digit())
    }
}

/// The most frequent value of a tallied field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub value: String,
    pub count: u64,
    /// `count` as a percentage of all parsed requests.
    pub share: f64,
}

/// Percentage of requests falling into one status class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusShare {
    pub class: StatusClass,
    pub count: u64,
    pub percentage: f64,
}

/// Immutable statistics derived once from a finished aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_requests: u64,
    pub total_bytes: u64,
    pub top_resource: RankedEntry,
    pub top_host: RankedEntry,
    /// Always five rows, 1xx through 5xx, including classes never seen.
    pub status_distribution: Vec<StatusShare>,
}

impl Summary {
    /// Percentage for a single status class, `0.0` when absent.
    pub fn percentage_for(&self, class: StatusClass) -> f64 {
        self.status_distribution
            .iter()
            .find(|s| s.class == class)
            .map(|s| s.percentage)
            .unwrap_or(0.0)
    }
}
