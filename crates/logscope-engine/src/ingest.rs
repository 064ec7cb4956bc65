use std::sync::Arc;

use tracing::warn;

use logscope_types::{RawRecord, SharedRecord};

/// Result of validating one fetched batch
#[derive(Clone, Debug, Default)]
pub struct IngestReport {
    /// The well-formed subset, in arrival order
    pub records: Vec<SharedRecord>,

    /// Number of malformed records dropped from the batch
    pub rejected: usize,
}

/// Validate a fetched batch, accepting the well-formed subset.
///
/// Malformed records (missing `id`, `timestamp`, `level`, or `service`)
/// are dropped and counted; a partially-malformed batch is never fatal.
pub fn ingest(batch: Vec<RawRecord>) -> IngestReport {
    let mut report = IngestReport::default();

    for raw in batch {
        match raw.validate() {
            Ok(record) => report.records.push(Arc::new(record)),
            Err(e) => {
                warn!(error = %e, "dropping malformed log record");
                report.rejected += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use logscope_types::LogLevel;

    use super::*;

    fn raw(id: Option<&str>, service: Option<&str>) -> RawRecord {
        RawRecord {
            id: id.map(String::from),
            timestamp: Some(Utc::now()),
            level: Some(LogLevel::Info),
            service: service.map(String::from),
            message: Some("ok".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_well_formed_subset() {
        let report = ingest(vec![
            raw(Some("1"), Some("backend")),
            raw(None, Some("backend")),
            raw(Some("3"), None),
            raw(Some("4"), Some("api")),
        ]);
        assert_eq!(report.rejected, 2);
        assert_eq!(
            report.records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "4"]
        );
    }

    #[test]
    fn test_empty_batch() {
        let report = ingest(Vec::new());
        assert!(report.records.is_empty());
        assert_eq!(report.rejected, 0);
    }
}
