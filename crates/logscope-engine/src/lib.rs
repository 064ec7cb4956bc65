//! Log query, filtering, and live-tail engine for logscope
//!
//! This crate provides record ingestion, the filter engine, aggregate
//! statistics, CSV export, and the query session that ties them to an
//! external log source with periodic refresh.

mod aggregate;
mod export;
mod filter;
mod ingest;
mod session;
mod source;

pub use aggregate::summarize;
pub use export::to_csv;
pub use filter::apply;
pub use ingest::{IngestReport, ingest};
pub use session::{QuerySession, SessionConfig};
pub use source::{LogSource, SourceQuery};

// Re-export types used in our public API
pub use logscope_types::{
    AggregateStats, FilterState, LevelFilter, LogLevel, LogRecord, RawRecord, ServiceFilter,
    SessionState, SharedRecord, SourceError, TimeRange, ValidationError,
};
