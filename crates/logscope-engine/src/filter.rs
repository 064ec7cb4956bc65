use logscope_types::{FilterState, LogRecord, SharedRecord};

/// Apply a filter to a record set, producing the visible view.
///
/// Pure and order-preserving: the output keeps the relative order of the
/// input and never invents records. Predicates compose conjunctively.
/// Time-range scoping is the log source's job at fetch time and is not
/// re-applied here.
pub fn apply(records: &[SharedRecord], filter: &FilterState) -> Vec<SharedRecord> {
    records
        .iter()
        .filter(|record| matches(record, filter))
        .cloned()
        .collect()
}

/// Check whether a single record satisfies every active filter dimension
pub fn matches(record: &LogRecord, filter: &FilterState) -> bool {
    if let Some(service) = filter.service.constraint() {
        if !record.service.eq_ignore_ascii_case(service) {
            return false;
        }
    }

    if let Some(level) = filter.level.constraint() {
        if record.level != *level {
            return false;
        }
    }

    // Empty search term means no text constraint
    if filter.search_term.is_empty() {
        return true;
    }

    let term = filter.search_term.to_lowercase();
    record.message.to_lowercase().contains(&term)
        || record.service.to_lowercase().contains(&term)
        || record
            .user_id
            .as_ref()
            .is_some_and(|id| id.to_lowercase().contains(&term))
}
