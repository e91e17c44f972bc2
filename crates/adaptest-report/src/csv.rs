//! Spreadsheet export: one header row, then one row per question record.

use std::path::Path;

use anyhow::{Context, Result};

use adaptest_core::record::{QuestionRecord, SessionLog};

const HEADER: [&str; 13] = [
    "number",
    "question",
    "level",
    "initial_answer",
    "confidence",
    "initial_time",
    "hint_binary",
    "example_binary",
    "second_answer",
    "second_time",
    "outcome",
    "score_after",
    "level_after",
];

/// Quote a field when it contains a separator, quote, or line break.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn outcome_name(record: &QuestionRecord) -> String {
    serde_json::to_value(record.outcome)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn row(record: &QuestionRecord) -> Vec<String> {
    vec![
        record.number.to_string(),
        record.question.clone(),
        record.level.to_string(),
        optional(record.initial_answer.as_deref()),
        optional(record.confidence),
        optional(record.initial_time),
        record.hint_binary.to_string(),
        record.example_binary.to_string(),
        optional(record.second_answer.as_deref()),
        optional(record.second_time),
        outcome_name(record),
        record.score_after.to_string(),
        record.level_after.to_string(),
    ]
}

/// Render the log's records as CSV text with CRLF line endings.
pub fn generate_csv(log: &SessionLog) -> String {
    let mut out = String::new();
    out.push_str(&HEADER.join(","));
    out.push_str("\r\n");

    for record in &log.records {
        let fields: Vec<String> = row(record).iter().map(|f| csv_escape(f)).collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }

    out
}

/// Write the CSV export to a file.
pub fn write_csv_report(log: &SessionLog, path: &Path) -> Result<()> {
    let csv = generate_csv(log);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write CSV export to {}", path.display()))?;
    Ok(())
}
