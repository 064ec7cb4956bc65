use std::collections::HashSet;

use logscope_types::{AggregateStats, SharedRecord};

/// Compute aggregate statistics over a record set.
///
/// The per-level map is sparse: levels absent from the input are never
/// materialized as explicit zero entries. Service distinctness is
/// case-insensitive, consistent with service matching.
pub fn summarize(records: &[SharedRecord]) -> AggregateStats {
    let mut stats = AggregateStats {
        total: records.len(),
        ..Default::default()
    };

    let mut services = HashSet::new();
    for record in records {
        *stats.per_level.entry(record.level.clone()).or_insert(0) += 1;
        services.insert(record.service.to_lowercase());
    }
    stats.distinct_services = services.len();

    stats
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use logscope_types::{LogLevel, LogRecord};

    use super::*;

    fn record(id: &str, service: &str, level: LogLevel) -> SharedRecord {
        Arc::new(LogRecord {
            id: id.to_string(),
            timestamp: Utc::now(),
            level,
            service: service.to_string(),
            message: String::new(),
            user_id: None,
            source_address: None,
            request_id: None,
            details: None,
        })
    }

    #[test]
    fn test_empty_set() {
        let stats = summarize(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.per_level.is_empty());
        assert_eq!(stats.distinct_services, 0);
    }

    #[test]
    fn test_per_level_sums_to_total() {
        let records = vec![
            record("1", "backend", LogLevel::Error),
            record("2", "backend", LogLevel::Error),
            record("3", "api", LogLevel::Info),
            record("4", "frontend", LogLevel::Other("notice".to_string())),
        ];
        let stats = summarize(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.per_level.values().sum::<usize>(), stats.total);
        assert_eq!(stats.level_count(&LogLevel::Error), 2);
        assert_eq!(stats.level_count(&LogLevel::Other("notice".to_string())), 1);
        // Sparse map: no zero entry for absent levels
        assert!(!stats.per_level.contains_key(&LogLevel::Warning));
        assert_eq!(stats.level_count(&LogLevel::Warning), 0);
    }

    #[test]
    fn test_distinct_services_case_insensitive() {
        let records = vec![
            record("1", "backend", LogLevel::Info),
            record("2", "Backend", LogLevel::Info),
            record("3", "api", LogLevel::Info),
        ];
        assert_eq!(summarize(&records).distinct_services, 2);
    }
}
