// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The wire format of a goss result document.
//!
//! Documents arrive from files, remote endpoints, piped stdin, or the stdout
//! of a local runner invocation, and always look like:
//!
//! ```json
//! {
//!   "results": [
//!     { "result": 0, "title": "...", "summary-line": "...",
//!       "duration": 123456789, "resource-id": "...",
//!       "meta": { "desc": "..." } }
//!   ],
//!   "summary": { "failed-count": 0, "total-duration": 123456789 }
//! }
//! ```
//!
//! Durations are nanoseconds. A `result` of 0 means pass, 1 means fail, and
//! 2 means skip; anything else is unexpected.

use serde::Deserialize;

/// A decoded result document: the ordered result entries plus the runner's
/// own summary counters.
///
/// Entries are kept as raw [`serde_json::Value`]s at this level. Goss has
/// been observed to emit entries whose `result` field is non-numeric in
/// pathological cases, and those entries must be filtered out (not rejected)
/// during extraction, so typed decoding of each entry is deferred to the
/// extraction step.
#[derive(Clone, Debug, Deserialize)]
pub struct ResultDocument {
    pub results: Vec<serde_json::Value>,
    pub summary: DocumentSummary,
}

/// The document-level summary counters gossamer consumes.
///
/// Goss writes more fields than these; the rest are ignored.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DocumentSummary {
    /// The runner's own count of failed tests. Cross-checked against the
    /// manual tally of the result entries.
    pub failed_count: i64,
    /// Wall-clock duration of the whole document, in nanoseconds.
    pub total_duration: i64,
}

/// One fully-typed result entry, decoded from a raw entry whose `result`
/// field has already been confirmed numeric.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawResultEntry {
    /// Raw outcome code: 0 pass, 1 fail, 2 skip.
    pub result: i64,
    /// Test name.
    pub title: String,
    /// One-line outcome summary produced by the runner.
    pub summary_line: String,
    /// Duration of this test, in nanoseconds.
    pub duration: i64,
    /// The resource the test examined.
    pub resource_id: String,
    pub meta: EntryMeta,
}

/// Free-form metadata attached to an entry. Only the description is used.
#[derive(Clone, Debug, Deserialize)]
pub struct EntryMeta {
    pub desc: String,
}
