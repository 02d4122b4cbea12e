// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized result records and document extraction.

use crate::errors::ExtractError;
use gossamer_metadata::{RawResultEntry, ResultDocument};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// The outcome of one test, derived from its raw result code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultOutcome {
    Pass,
    Fail,
    Skip,
    /// Any code outside 0..=2. Always an unexpected, bad result.
    Unknown,
}

impl ResultOutcome {
    /// Maps a raw result code to an outcome.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Pass,
            1 => Self::Fail,
            2 => Self::Skip,
            _ => Self::Unknown,
        }
    }

    /// True for outcomes that must be surfaced as errors (failures and
    /// unknown codes).
    pub fn is_bad(self) -> bool {
        matches!(self, Self::Fail | Self::Unknown)
    }
}

/// One test's normalized outcome. Constructed once per raw entry,
/// immutable thereafter.
#[derive(Clone, Debug)]
pub struct ResultRecord {
    /// Test name.
    pub title: String,
    pub outcome: ResultOutcome,
    /// The raw result code, kept for sorting and for display of unknown
    /// outcomes.
    pub raw_code: i64,
    /// One-line outcome summary from the runner.
    pub summary_line: String,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// The resource the test examined.
    pub resource_id: String,
    /// Human-readable test description.
    pub description: String,
}

impl ResultRecord {
    fn from_entry(entry: RawResultEntry) -> Self {
        Self {
            title: entry.title,
            outcome: ResultOutcome::from_code(entry.result),
            raw_code: entry.result,
            summary_line: entry.summary_line,
            duration_secs: nanos_to_secs(entry.duration),
            resource_id: entry.resource_id,
            description: entry.meta.desc,
        }
    }
}

/// The extracted contents of one result document.
#[derive(Clone, Debug)]
pub struct ExtractedResults {
    /// Records sorted by (title, raw code), so repeated runs of the same
    /// test group together with passes and failures adjacent.
    pub records: Vec<ResultRecord>,
    /// The document's self-reported failure count, cross-checked against
    /// the manual tally during reporting.
    pub failed_count: i64,
    /// The document's total duration in seconds.
    pub total_duration_secs: f64,
}

/// Validates a decoded result document and extracts its records.
///
/// Entries whose `result` field is present but non-numeric are silently
/// excluded; an entry with no `result` field at all, a missing required
/// field in a selected entry, or a document with no numeric-outcome entries
/// is a [shape error](ExtractError).
pub fn extract_results(document: &serde_json::Value) -> Result<ExtractedResults, ExtractError> {
    let document: ResultDocument = serde_json::from_value(document.clone())
        .map_err(|err| ExtractError::UnexpectedFormat { err })?;

    let mut records = Vec::with_capacity(document.results.len());
    for (index, entry) in document.results.into_iter().enumerate() {
        let result = entry
            .get("result")
            .ok_or(ExtractError::EntryMissingResult { index })?;
        if !result.is_i64() {
            continue;
        }
        let entry: RawResultEntry = serde_json::from_value(entry)
            .map_err(|err| ExtractError::UnexpectedFormat { err })?;
        records.push(ResultRecord::from_entry(entry));
    }

    if records.is_empty() {
        return Err(ExtractError::NoResults);
    }

    records.sort_by(|a, b| (a.title.as_str(), a.raw_code).cmp(&(b.title.as_str(), b.raw_code)));

    Ok(ExtractedResults {
        records,
        failed_count: document.summary.failed_count,
        total_duration_secs: nanos_to_secs(document.summary.total_duration),
    })
}

fn nanos_to_secs(nanos: i64) -> f64 {
    nanos as f64 / NANOS_PER_SEC
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn entry(result: serde_json::Value, title: &str) -> serde_json::Value {
        json!({
            "result": result,
            "title": title,
            "summary-line": format!("{title}: matches expectation"),
            "duration": 250_000_000_u64,
            "resource-id": title,
            "meta": { "desc": format!("checks {title}") },
        })
    }

    fn document(entries: Vec<serde_json::Value>, failed_count: i64) -> serde_json::Value {
        json!({
            "results": entries,
            "summary": { "failed-count": failed_count, "total-duration": 1_500_000_000_u64 },
        })
    }

    #[test_case(0, ResultOutcome::Pass; "pass")]
    #[test_case(1, ResultOutcome::Fail; "fail")]
    #[test_case(2, ResultOutcome::Skip; "skip")]
    #[test_case(3, ResultOutcome::Unknown; "unknown positive")]
    #[test_case(-1, ResultOutcome::Unknown; "unknown negative")]
    fn outcome_from_code(code: i64, expected: ResultOutcome) {
        assert_eq!(ResultOutcome::from_code(code), expected);
    }

    #[test]
    fn records_are_sorted_by_title_then_code() {
        let doc = document(
            vec![
                entry(json!(1), "ntp-sync"),
                entry(json!(0), "dns-resolution"),
                entry(json!(0), "ntp-sync"),
            ],
            1,
        );
        let extracted = extract_results(&doc).unwrap();
        let order: Vec<_> = extracted
            .records
            .iter()
            .map(|r| (r.title.as_str(), r.raw_code))
            .collect();
        assert_eq!(
            order,
            [("dns-resolution", 0), ("ntp-sync", 0), ("ntp-sync", 1)]
        );
    }

    #[test]
    fn durations_convert_from_nanoseconds() {
        let doc = document(vec![entry(json!(0), "dns-resolution")], 0);
        let extracted = extract_results(&doc).unwrap();
        let record = &extracted.records[0];
        assert!((record.duration_secs * NANOS_PER_SEC - 250_000_000.0).abs() < 1e-6);
        assert!((extracted.total_duration_secs - 1.5).abs() < 1e-6);
    }

    #[test]
    fn non_numeric_results_are_excluded() {
        let doc = document(
            vec![
                entry(json!("skipped"), "bgp-neighbors"),
                entry(json!(0), "dns-resolution"),
            ],
            0,
        );
        let extracted = extract_results(&doc).unwrap();
        assert_eq!(extracted.records.len(), 1);
        assert_eq!(extracted.records[0].title, "dns-resolution");
    }

    #[test]
    fn all_non_numeric_results_is_a_shape_error() {
        let doc = document(vec![entry(json!("skipped"), "bgp-neighbors")], 0);
        let err = extract_results(&doc).unwrap_err();
        assert!(matches!(err, ExtractError::NoResults));
    }

    #[test]
    fn entry_without_result_field_is_a_shape_error() {
        let doc = document(vec![json!({ "title": "mtu-check" })], 0);
        let err = extract_results(&doc).unwrap_err();
        assert!(matches!(err, ExtractError::EntryMissingResult { index: 0 }));
    }

    #[test]
    fn missing_summary_is_a_shape_error() {
        let doc = json!({ "results": [entry(json!(0), "dns-resolution")] });
        let err = extract_results(&doc).unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedFormat { .. }));
    }

    #[test]
    fn selected_entry_missing_fields_is_a_shape_error() {
        let doc = document(vec![json!({ "result": 0, "title": "mtu-check" })], 0);
        let err = extract_results(&doc).unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedFormat { .. }));
    }
}
