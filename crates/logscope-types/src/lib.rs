//! Shared types for logscope
//!
//! This crate contains the data contracts used across the logscope crates:
//! the log record model, filter state, aggregate statistics, and the error
//! taxonomy.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Log Levels
// ============================================================================

/// Log severity level.
///
/// Unrecognized values are preserved (lowercased) in `Other` so they still
/// participate in filtering and counting under their literal value; only
/// display falls back to a generic bucket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Success,
    Debug,
    Other(String),
}

impl LogLevel {
    /// Parse a log level from its string form (case-insensitive)
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warning" => Self::Warning,
            "info" => Self::Info,
            "success" => Self::Success,
            "debug" => Self::Debug,
            other => Self::Other(other.to_string()),
        }
    }

    /// The literal string form of this level
    pub fn as_str(&self) -> &str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
            Self::Debug => "debug",
            Self::Other(s) => s,
        }
    }

    /// Whether this is one of the well-known levels (false means the
    /// caller should render it in the generic/default bucket)
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Time Ranges
// ============================================================================

/// Relative time window, resolved to an absolute interval at query time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeRange {
    /// Last 1 hour
    LastHour,
    /// Last 24 hours
    #[default]
    Last24Hours,
    /// Last 7 days
    Last7Days,
    /// Last 30 days
    Last30Days,
}

impl TimeRange {
    /// Get the number of seconds for this time range
    pub fn as_seconds(&self) -> i64 {
        match self {
            Self::LastHour => 60 * 60,
            Self::Last24Hours => 24 * 60 * 60,
            Self::Last7Days => 7 * 24 * 60 * 60,
            Self::Last30Days => 30 * 24 * 60 * 60,
        }
    }

    /// Get display label for this time range
    pub fn label(&self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
        }
    }

    /// Resolve to an absolute `[start, now)` interval
    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - chrono::Duration::seconds(self.as_seconds()), now)
    }
}

// ============================================================================
// Log Records
// ============================================================================

/// A log record as received from the log source, before validation.
///
/// Every field is optional at the boundary; `validate` enforces the
/// required subset. The original wire format spells the network origin
/// `ip_address`, accepted here as an alias.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub level: Option<LogLevel>,

    #[serde(default)]
    pub service: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default, alias = "ip_address")]
    pub source_address: Option<String>,

    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(default)]
    pub details: Option<HashMap<String, Value>>,
}

impl RawRecord {
    /// Validate this record, producing an immutable `LogRecord`.
    ///
    /// A record missing `id`, `timestamp`, `level`, or `service` is
    /// malformed and rejected.
    pub fn validate(self) -> Result<LogRecord, ValidationError> {
        Ok(LogRecord {
            id: self.id.ok_or(ValidationError::MissingField("id"))?,
            timestamp: self
                .timestamp
                .ok_or(ValidationError::MissingField("timestamp"))?,
            level: self.level.ok_or(ValidationError::MissingField("level"))?,
            service: self
                .service
                .ok_or(ValidationError::MissingField("service"))?,
            message: self.message.unwrap_or_default(),
            user_id: self.user_id,
            source_address: self.source_address,
            request_id: self.request_id,
            details: self.details,
        })
    }
}

/// A validated log record. Immutable once ingested; updates only arrive as
/// replacement record sets from a refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Unique identifier, stable across refreshes for a given record
    pub id: String,

    /// Absolute instant, timezone-normalized at the boundary
    pub timestamp: DateTime<Utc>,

    /// Severity level
    pub level: LogLevel,

    /// Originating subsystem (free-form; matched case-insensitively)
    pub service: String,

    /// Human-readable text
    pub message: String,

    /// Attributable user session, if any
    pub user_id: Option<String>,

    /// Network origin
    pub source_address: Option<String>,

    /// Correlation identifier for cross-service tracing
    pub request_id: Option<String>,

    /// Opaque nested detail payload, passed through verbatim
    pub details: Option<HashMap<String, Value>>,
}

/// Records are shared between the stored set, derived views, and callers
/// without deep copies
pub type SharedRecord = std::sync::Arc<LogRecord>;

// ============================================================================
// Filter State
// ============================================================================

/// Service constraint: everything, or one concrete service
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ServiceFilter {
    #[default]
    All,
    Service(String),
}

impl ServiceFilter {
    /// The concrete constraint, if any
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Service(s) => Some(s),
        }
    }
}

/// Level constraint: everything, or one concrete level
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Level(LogLevel),
}

impl LevelFilter {
    /// The concrete constraint, if any
    pub fn constraint(&self) -> Option<&LogLevel> {
        match self {
            Self::All => None,
            Self::Level(level) => Some(level),
        }
    }
}

/// Fully-defined filter state; defaults apply when unset
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FilterState {
    /// Case-insensitive substring matched against message, service, and
    /// user id; empty means no text constraint
    pub search_term: String,

    pub service: ServiceFilter,

    pub level: LevelFilter,

    pub time_range: TimeRange,
}

// ============================================================================
// Aggregate Statistics
// ============================================================================

/// Statistics over a record set. Derived, never cached across refreshes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateStats {
    /// Total record count
    pub total: usize,

    /// Count per level; sparse, absent levels are implicitly zero
    pub per_level: HashMap<LogLevel, usize>,

    /// Number of unique service values (case-insensitive)
    pub distinct_services: usize,
}

impl AggregateStats {
    /// Count for one level (zero when absent from the sparse map)
    pub fn level_count(&self, level: &LogLevel) -> usize {
        self.per_level.get(level).copied().unwrap_or(0)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Query session lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No fetch in flight, live polling off
    #[default]
    Idle,
    /// Fetch in flight
    Loading,
    /// Successfully loaded, periodic refresh armed
    Live,
    /// Last fetch failed; previous data, if any, is retained
    Error,
}

// ============================================================================
// Errors
// ============================================================================

/// A malformed record at ingestion. Not fatal: the record is dropped and
/// the rejection counted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),
}

/// A failed query against the external log source
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("log source query failed: {0}")]
    Query(String),

    #[error("log source query timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_case_insensitive() {
        assert_eq!(LogLevel::parse("ERROR"), LogLevel::Error);
        assert_eq!(LogLevel::parse("Warning"), LogLevel::Warning);
        assert_eq!(LogLevel::parse("success"), LogLevel::Success);
    }

    #[test]
    fn test_level_unrecognized_keeps_literal() {
        let level = LogLevel::parse("NOTICE");
        assert_eq!(level, LogLevel::Other("notice".to_string()));
        assert_eq!(level.as_str(), "notice");
        assert!(!level.is_recognized());
    }

    #[test]
    fn test_level_serde_round_trip() {
        let json = serde_json::to_string(&LogLevel::Other("audit".to_string())).unwrap();
        assert_eq!(json, "\"audit\"");
        let back: LogLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LogLevel::Other("audit".to_string()));
    }

    #[test]
    fn test_time_range_resolve() {
        let now = Utc::now();
        let (start, end) = TimeRange::LastHour.resolve(now);
        assert_eq!(end, now);
        assert_eq!((end - start).num_seconds(), 3600);
    }

    #[test]
    fn test_raw_record_missing_service_rejected() {
        let raw = RawRecord {
            id: Some("1".to_string()),
            timestamp: Some(Utc::now()),
            level: Some(LogLevel::Info),
            ..Default::default()
        };
        assert_eq!(
            raw.validate().unwrap_err(),
            ValidationError::MissingField("service")
        );
    }

    #[test]
    fn test_raw_record_ip_address_alias() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"id":"1","timestamp":"2024-01-15T10:30:00Z","level":"info",
                "service":"backend","message":"ok","ip_address":"10.0.1.5"}"#,
        )
        .unwrap();
        let record = raw.validate().unwrap();
        assert_eq!(record.source_address.as_deref(), Some("10.0.1.5"));
    }

    #[test]
    fn test_default_filter_is_unconstrained() {
        let filter = FilterState::default();
        assert!(filter.search_term.is_empty());
        assert_eq!(filter.service, ServiceFilter::All);
        assert_eq!(filter.level, LevelFilter::All);
        assert_eq!(filter.time_range, TimeRange::Last24Hours);
    }
}
