//! Plain-text rendering of the user table.

use std::fmt::Write;

use usertable_core::{Record, SyncOp, SyncOutcome, SyncReport, TableView};

const NAME_WIDTH: usize = 20;
const ADDRESS_WIDTH: usize = 32;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Render the current page. The open row shows its draft and is marked `*`;
/// rows with a request in flight are marked `~`.
pub fn table(view: &TableView) -> String {
    let sync = view.sync();
    let editing = sync.current_edit();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "  {:>4}  {:>5}  {:<name$}  {:>4}  {:<addr$}",
        "Key",
        "Id",
        "Name",
        "Age",
        "Address",
        name = NAME_WIDTH,
        addr = ADDRESS_WIDTH
    );

    for record in view.visible() {
        let (marker, name, age, address) = match editing {
            Some((key, draft)) if key == record.key => {
                ('*', draft.name.as_str(), draft.age.clone(), draft.address.as_str())
            }
            _ => row_values(record, sync.is_pending(record.key)),
        };
        let _ = writeln!(
            out,
            "{} {:>4}  {:>5}  {:<name$}  {:>4}  {:<addr$}",
            marker,
            record.key,
            record.remote_id,
            truncate_string(name, NAME_WIDTH),
            age,
            truncate_string(address, ADDRESS_WIDTH),
            name = NAME_WIDTH,
            addr = ADDRESS_WIDTH
        );
    }

    let _ = writeln!(
        out,
        "Page {}/{} - {} rows - loaded {}{}",
        view.current_page(),
        view.page_count(),
        sync.list_records().len(),
        sync.cache().age_display(),
        match sync.in_flight() {
            0 => String::new(),
            n => format!(" - {} pending", n),
        }
    );
    out
}

fn row_values(record: &Record, pending: bool) -> (char, &str, String, &str) {
    (
        if pending { '~' } else { ' ' },
        record.fields.name.as_str(),
        record.fields.age.to_string(),
        record.fields.address.as_str(),
    )
}

/// One-line summary of a store response
pub fn report(report: &SyncReport) -> String {
    match (&report.op, &report.outcome) {
        (SyncOp::Save, SyncOutcome::Committed(fields)) => {
            format!("Row {} saved: {}, {}, {}", report.key, fields.name, fields.age, fields.address)
        }
        (SyncOp::Delete, SyncOutcome::Committed(fields)) => {
            format!("Row {} ({}) deleted", report.key, fields.name)
        }
        (op, SyncOutcome::Failed(reason)) => {
            format!("Row {} {} failed: {}", report.key, op, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usertable_core::{RecordKey, RequestId, UserFields};

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Zoë Müller", 3), "Zoë");
    }

    #[test]
    fn test_report_lines() {
        let saved = SyncReport {
            request: RequestId(1),
            key: RecordKey(4),
            op: SyncOp::Save,
            outcome: SyncOutcome::Committed(UserFields {
                name: "A".to_string(),
                age: 21,
                address: "X".to_string(),
            }),
        };
        assert_eq!(report(&saved), "Row 4 saved: A, 21, X");

        let failed = SyncReport {
            outcome: SyncOutcome::Failed("Store declined the delete".to_string()),
            op: SyncOp::Delete,
            ..saved
        };
        assert_eq!(report(&failed), "Row 4 delete failed: Store declined the delete");
    }
}
