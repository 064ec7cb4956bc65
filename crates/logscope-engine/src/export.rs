use logscope_types::SharedRecord;

/// Export column order. The nested `details` payload is out of scope for
/// the flat export format.
const COLUMNS: [&str; 7] = [
    "timestamp",
    "level",
    "service",
    "message",
    "user_id",
    "source_address",
    "request_id",
];

/// Serialize a record set to CSV, one row per record plus a header row.
///
/// Fields containing separators, quotes, or newlines are double-quote
/// escaped so a conformant reader reproduces the original field values.
pub fn to_csv(records: &[SharedRecord]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&COLUMNS.join(","));
    out.push('\n');

    for record in records {
        let ts = record.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        let fields = [
            ts.as_str(),
            record.level.as_str(),
            record.service.as_str(),
            record.message.as_str(),
            record.user_id.as_deref().unwrap_or(""),
            record.source_address.as_deref().unwrap_or(""),
            record.request_id.as_deref().unwrap_or(""),
        ];

        let mut first = true;
        for field in fields {
            if !first {
                out.push(',');
            }
            first = false;
            push_escaped(&mut out, field);
        }
        out.push('\n');
    }

    out.into_bytes()
}

fn push_escaped(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}
