//! Shared helpers for picking apart Reporting API responses

use serde_json::Value;

use super::reports::Report;

/// Take the first report out of a `reports:batchGet` response.
///
/// `None` when `reports` is missing, empty or not a list of objects.
pub fn take_first_report(response: Value) -> Option<Report> {
    let Value::Object(mut body) = response else {
        return None;
    };
    let Value::Array(reports) = body.remove("reports")? else {
        return None;
    };
    match reports.into_iter().next()? {
        Value::Object(report) => Some(report),
        _ => None,
    }
}

/// `data.rows` of a report, or an empty vec if missing.
pub fn extract_rows(report: &Report) -> Vec<Value> {
    report
        .get("data")
        .and_then(|data| data.get("rows"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// The report's `nextPageToken`, ignoring empty tokens.
pub fn next_page_token(report: &Report) -> Option<String> {
    report
        .get("nextPageToken")
        .and_then(|v| v.as_str())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Replace `data.rows` with `rows` when the report has a non-empty `data` object.
pub fn replace_rows(report: &mut Report, rows: Vec<Value>) {
    if let Some(Value::Object(data)) = report.get_mut("data") {
        if !data.is_empty() {
            data.insert("rows".to_string(), Value::Array(rows));
        }
    }
}
