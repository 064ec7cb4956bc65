use async_trait::async_trait;
use chrono::{DateTime, Utc};

use logscope_types::{FilterState, LogLevel, RawRecord, SourceError};

/// One query against the external log source: an absolute time interval
/// plus optional server-side service/level constraints. The free-text
/// search term is never sent to the source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub service: Option<String>,
    pub level: Option<LogLevel>,
}

impl SourceQuery {
    /// Resolve a filter's relative time window to an absolute interval
    /// and carry over its server-side constraints
    pub fn from_filter(filter: &FilterState, now: DateTime<Utc>) -> Self {
        let (start, end) = filter.time_range.resolve(now);
        Self {
            start,
            end,
            service: filter.service.constraint().map(String::from),
            level: filter.level.constraint().cloned(),
        }
    }
}

/// The external log source consumed by a query session.
///
/// Implementations own transport, storage, and server-side filtering; the
/// engine only sees record batches scoped to the requested interval.
#[async_trait]
pub trait LogSource: Send + Sync + 'static {
    async fn query(&self, query: SourceQuery) -> Result<Vec<RawRecord>, SourceError>;
}
