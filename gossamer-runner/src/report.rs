// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The aggregation and reporting phase.
//!
//! The run is a strict linear sequence: results files are processed
//! sequentially, remote and local-invocation sources are handed to the
//! collection pool as one batch, stdin is read last, and then every
//! successfully-extracted source is rendered and tallied in the original
//! input order. Collection is the only concurrent phase; the tally is
//! mutated exclusively on the calling thread, after collection completes.

use crate::{
    engine::CollectionPool,
    errors::ReadSourceError,
    fetch::FetchOutcome,
    helpers::{display_error_chain, display_secs},
    results::{ExtractedResults, ResultOutcome, ResultRecord, extract_results},
    run_log::OutputLog,
    scrape_log::ScrapeLog,
    source::{Source, SourceList},
};
use camino::{Utf8Path, Utf8PathBuf};
use gossamer_metadata::GossamerExitCode;
use owo_colors::{OwoColorize, Style, style};
use serde_json::json;
use std::{
    error::Error,
    io::{Read, Write},
};
use tracing::{debug, error, info, warn};

/// Process-wide outcome accumulator. Mutated only by the single-threaded
/// aggregation phase.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunTally {
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
    /// Set for any failure unrelated to test outcomes: fetch errors,
    /// unreadable files, malformed documents.
    pub unexpected_error: bool,
}

impl RunTally {
    /// True if at least one record was tallied.
    pub fn any_executed(&self) -> bool {
        self.passed + self.failed + self.unknown > 0
    }

    /// The final exit code for this tally. Unexpected errors and unknown
    /// results dominate; plain test failures come next.
    pub fn exit_code(&self) -> i32 {
        if self.unexpected_error || self.unknown > 0 {
            GossamerExitCode::UNEXPECTED_ERROR
        } else if self.failed > 0 {
            GossamerExitCode::TEST_FAILURES
        } else {
            GossamerExitCode::OK
        }
    }
}

/// Per-source outcome counts returned by rendering.
#[derive(Clone, Copy, Debug, Default)]
struct SourceCounts {
    passed: usize,
    failed: usize,
    skipped: usize,
    unknown: usize,
}

/// Styles for console output.
#[derive(Clone, Copy, Debug, Default)]
pub struct Styles {
    error: Style,
    warning: Style,
    ok: Style,
}

impl Styles {
    pub fn colorized() -> Self {
        Self {
            error: style().bright_red(),
            warning: style().bright_yellow(),
            ok: style().bright_green(),
        }
    }

    pub fn plain() -> Self {
        Self::default()
    }
}

/// One source's successfully-extracted results, queued for rendering.
#[derive(Clone, Debug)]
struct ExtractedSource {
    raw: String,
    node: String,
    results: ExtractedResults,
}

/// Renders results to the console, the full-output file, and the scrape
/// log, and accumulates the run tally.
pub struct Reporter {
    styles: Styles,
    out: OutputLog,
    scrape: ScrapeLog,
    debug_log_path: Option<Utf8PathBuf>,
    tally: RunTally,
}

impl Reporter {
    pub fn new(
        styles: Styles,
        out: OutputLog,
        scrape: ScrapeLog,
        debug_log_path: Option<Utf8PathBuf>,
    ) -> Self {
        Self {
            styles,
            out,
            scrape,
            debug_log_path,
            tally: RunTally::default(),
        }
    }

    pub fn tally(&self) -> RunTally {
        self.tally
    }

    /// Reports an error on stderr, the debug log, and the output file.
    pub fn error(&mut self, stderr: &mut dyn Write, message: &str) {
        console(
            stderr,
            &format!("ERROR: {message}").style(self.styles.error).to_string(),
        );
        error!("{message}");
        self.out.line(&format!("ERROR: {message}"));
    }

    /// Reports a warning on stderr, the debug log, and the output file.
    pub fn warning(&mut self, stderr: &mut dyn Write, message: &str) {
        console(
            stderr,
            &format!("WARNING: {message}")
                .style(self.styles.warning)
                .to_string(),
        );
        warn!("{message}");
        self.out.line(&format!("WARNING: {message}"));
    }

    /// A progress note that goes to the console, the debug log, and the
    /// output file.
    fn progress(&mut self, stdout: &mut dyn Write, message: &str) {
        console(stdout, message);
        info!("{message}");
        self.out.line(message);
    }

    /// A blank separator line on the console and in the output file.
    fn newline(&mut self, stdout: &mut dyn Write) {
        console(stdout, "");
        self.out.line("");
    }

    fn reading_message(&mut self, stdout: &mut dyn Write, node: &str, label: Option<&str>) {
        let styled_node = node.style(self.styles.warning).to_string();
        match label {
            Some(label) => {
                console(
                    stdout,
                    &format!("Reading test results for node {styled_node} ({label})"),
                );
                self.out
                    .line(&format!("Reading test results for node {node} ({label})"));
            }
            None => {
                console(stdout, &format!("Reading test results for node {styled_node}"));
                self.out.line(&format!("Reading test results for node {node}"));
            }
        }
    }

    /// Reports a per-source error and marks the run as having hit an
    /// unexpected condition. The source is skipped for tallying.
    fn skip_source(&mut self, stderr: &mut dyn Write, source: &str, err: &dyn Error) {
        self.error(stderr, &display_error_chain(err));
        self.error(stderr, &format!("Skipping {source} due to error\n"));
        self.tally.unexpected_error = true;
    }

    fn skip_source_message(&mut self, stderr: &mut dyn Write, source: &str, message: &str) {
        self.error(stderr, message);
        self.error(stderr, &format!("Skipping {source} due to error\n"));
        self.tally.unexpected_error = true;
    }

    /// Renders one source's records, writes the per-source summary, and
    /// cross-checks the document's self-reported failure count.
    fn show_source_results(
        &mut self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        source: &ExtractedSource,
    ) -> SourceCounts {
        let mut counts = SourceCounts::default();
        let total = source.results.records.len();

        for record in &source.results.records {
            let result_line = match record.outcome {
                ResultOutcome::Pass => {
                    counts.passed += 1;
                    "Result: PASS".to_owned()
                }
                ResultOutcome::Fail => {
                    counts.failed += 1;
                    "Result: FAIL".to_owned()
                }
                ResultOutcome::Skip => {
                    // Skips are not usually due to error.
                    counts.skipped += 1;
                    "Result: SKIPPED".to_owned()
                }
                ResultOutcome::Unknown => {
                    // This should never happen.
                    counts.unknown += 1;
                    format!("Result: UNKNOWN (result code = {})", record.raw_code)
                }
            };

            let block = render_record_block(&result_line, &source.raw, &source.node, record);
            self.out.line(&block);
            self.scrape_test_record(source, record);

            if record.outcome.is_bad() {
                // Separate the first bad record of a source from the
                // progress output above it.
                if counts.failed + counts.unknown == 1 {
                    self.newline(stdout);
                }
                console(stderr, &block.style(self.styles.error).to_string());
            }
        }

        let summary = [
            format!("Node: {}", source.node),
            format!("Source: {}", source.raw),
            format!("Total Tests: {total}"),
            format!("Total Passed: {}", counts.passed),
            format!("Total Failed: {}", counts.failed),
            format!("Total Skipped: {}", counts.skipped),
            format!("Total Unknown: {}", counts.unknown),
            format!(
                "Total Execution Time: {} seconds",
                display_secs(source.results.total_duration_secs)
            ),
        ]
        .join(", ");
        info!("{summary}");
        self.out.line(&summary);
        self.scrape.record(
            "source summary",
            &[
                ("node", json!(source.node)),
                ("source", json!(source.raw)),
                ("total_tests", json!(total)),
                ("total_passed", json!(counts.passed)),
                ("total_failed", json!(counts.failed)),
                ("total_skipped", json!(counts.skipped)),
                ("total_unknown", json!(counts.unknown)),
                (
                    "total_duration_seconds",
                    json!(source.results.total_duration_secs),
                ),
            ],
        );

        if source.results.failed_count != counts.failed as i64 {
            // The document's own bookkeeping disagrees with its record
            // list. Worth surfacing, not worth aborting on.
            if counts.failed == 0 {
                self.newline(stdout);
            }
            let mismatch = format!(
                "failed-count in results ({}) does not match manual tally of test failures ({})",
                source.results.failed_count, counts.failed
            );
            self.warning(stderr, &mismatch);
            self.newline(stdout);
        }

        counts
    }

    fn scrape_test_record(&mut self, source: &ExtractedSource, record: &ResultRecord) {
        let result = match record.outcome {
            ResultOutcome::Pass => "PASS",
            ResultOutcome::Fail => "FAIL",
            ResultOutcome::Skip => "SKIPPED",
            ResultOutcome::Unknown => "UNKNOWN",
        };
        self.scrape.record(
            "test result",
            &[
                ("test_name", json!(record.title)),
                ("result", json!(result)),
                ("result_code", json!(record.raw_code)),
                ("node", json!(source.node)),
                ("source", json!(source.raw)),
                ("resource_id", json!(record.resource_id)),
                ("duration_seconds", json!(record.duration_secs)),
            ],
        );
    }

    /// Emits the grand-total summary and the follow-up warnings or errors
    /// the totals call for.
    fn grand_total(&mut self, stdout: &mut dyn Write, stderr: &mut dyn Write) {
        let tally = self.tally;
        let summary = if tally.unknown > 0 {
            format!(
                "GRAND TOTAL: {} passed, {} failed, {} unknown results",
                tally.passed, tally.failed, tally.unknown
            )
        } else {
            format!("GRAND TOTAL: {} passed, {} failed", tally.passed, tally.failed)
        };

        self.newline(stdout);
        self.out.line(&summary);
        self.scrape.record(
            "grand total",
            &[
                ("total_passed", json!(tally.passed)),
                ("total_failed", json!(tally.failed)),
                ("total_unknown", json!(tally.unknown)),
            ],
        );

        if !tally.any_executed() {
            console(stderr, &summary.style(self.styles.warning).to_string());
            warn!("{summary}");
            self.warning(stderr, "No tests executed");
        } else if tally.failed > 0 || tally.unknown > 0 {
            console(stderr, &summary.style(self.styles.error).to_string());
            error!("{summary}");
            if tally.failed > 0 {
                self.error(stderr, "There was at least one test failure");
            }
        } else {
            console(stdout, &summary.style(self.styles.ok).to_string());
            info!("{summary}");
        }

        if tally.unexpected_error || tally.unknown > 0 {
            self.error(
                stderr,
                "Errors occurred during execution beyond just test failures.",
            );
        }
    }

    /// Prints the final PASSED/FAILED line and returns the process exit
    /// code. Always the last output of a run.
    pub fn final_status(&mut self, stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
        let code = self.tally.exit_code();
        match code {
            GossamerExitCode::OK => {
                console(stdout, &"\nPASSED".style(self.styles.ok).to_string());
                self.out.line("\nPASSED");
                info!("PASSED; exiting with return code {code}");
            }
            GossamerExitCode::TEST_FAILURES => {
                console(stderr, &"\nFAILED".style(self.styles.error).to_string());
                self.out.line("\nFAILED");
                error!("FAILED (failed tests); exiting with return code {code}");
            }
            _ => {
                if let Some(debug_log) = &self.debug_log_path {
                    console(
                        stdout,
                        &format!(
                            "Full script output: {}\nScript debug log: {debug_log}",
                            self.out.path()
                        ),
                    );
                }
                console(stderr, &"\nFAILED".style(self.styles.error).to_string());
                self.out.line("\nFAILED");
                error!("FAILED; exiting with return code {code}");
            }
        }
        code
    }
}

/// Drives the whole run: ProcessFiles → ProcessParallel → ProcessStdin →
/// Aggregate → Report. Returns the final tally; the caller turns it into an
/// exit code via [`Reporter::final_status`].
pub fn run_collection<F>(
    sources: &SourceList,
    pool: &CollectionPool,
    fetch: F,
    stdin: &mut dyn Read,
    reporter: &mut Reporter,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> RunTally
where
    F: Fn(&Source) -> FetchOutcome + Sync,
{
    let mut extracted: Vec<ExtractedSource> = Vec::new();

    for source in &sources.files {
        let Source::ResultsFile { raw, path } = source else {
            continue;
        };
        reporter.reading_message(stdout, source.node(), Some(raw.as_str()));
        debug!("reading {raw} for JSON results");
        let document = match read_results_file(path) {
            Ok(document) => document,
            Err(err) => {
                reporter.newline(stdout);
                reporter.skip_source(stderr, raw, &err);
                continue;
            }
        };
        push_extracted(&mut extracted, source, &document, reporter, stdout, stderr);
    }

    if !sources.parallel.is_empty() {
        reporter.progress(stdout, "Running remote tests");
        let outcomes = pool.collect(&sources.parallel, fetch);
        // Walk the batch in the original source order, not completion
        // order, so reports are deterministic.
        for source in &sources.parallel {
            match outcomes.get(source.raw()) {
                None => {
                    reporter.skip_source_message(
                        stderr,
                        source.raw(),
                        &format!(
                            "Internal error. Unable to find results or an error message for {}",
                            source.raw()
                        ),
                    );
                }
                Some(FetchOutcome::Error(message)) => {
                    reporter.skip_source_message(
                        stderr,
                        source.raw(),
                        &format!(
                            "Error encountered running {} tests: {message}",
                            source.raw()
                        ),
                    );
                }
                Some(FetchOutcome::Document(document)) => {
                    push_extracted(&mut extracted, source, document, reporter, stdout, stderr);
                }
            }
        }
    }

    if let Some(source) = &sources.stdin {
        let Source::Stdin { raw, label } = source else {
            unreachable!("stdin slot only holds stdin sources");
        };
        reporter.reading_message(stdout, source.node(), label.as_deref());
        debug!("reading standard input for JSON results");
        match read_stdin(stdin, raw) {
            Ok(document) => {
                push_extracted(&mut extracted, source, &document, reporter, stdout, stderr);
            }
            Err(err) => {
                reporter.newline(stdout);
                reporter.skip_source(stderr, raw, &err);
            }
        }
    }

    reporter.progress(stdout, "\nChecking test results");
    console(stdout, "Only errors will be printed to the screen");
    for source in &extracted {
        debug!(source = %source.raw, "rendering results");
        let counts = reporter.show_source_results(stdout, stderr, source);
        reporter.tally.passed += counts.passed;
        reporter.tally.failed += counts.failed;
        reporter.tally.unknown += counts.unknown;
    }

    reporter.grand_total(stdout, stderr);
    reporter.tally
}

/// Extracts a fetched document and queues it for rendering, or reports the
/// extraction failure and skips the source.
fn push_extracted(
    extracted: &mut Vec<ExtractedSource>,
    source: &Source,
    document: &serde_json::Value,
    reporter: &mut Reporter,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) {
    match extract_results(document) {
        Ok(results) => extracted.push(ExtractedSource {
            raw: source.raw().to_owned(),
            node: source.node().to_owned(),
            results,
        }),
        Err(err) => {
            reporter.newline(stdout);
            reporter.skip_source(stderr, source.raw(), &err);
        }
    }
}

fn read_results_file(path: &Utf8Path) -> Result<serde_json::Value, ReadSourceError> {
    let text = std::fs::read_to_string(path).map_err(|err| ReadSourceError::Read {
        path: path.to_path_buf(),
        err,
    })?;
    serde_json::from_str(&text).map_err(|err| ReadSourceError::Decode {
        source: path.to_string(),
        err,
    })
}

fn read_stdin(stdin: &mut dyn Read, raw: &str) -> Result<serde_json::Value, ReadSourceError> {
    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .map_err(|err| ReadSourceError::Stdin { err })?;
    serde_json::from_str(&text).map_err(|err| ReadSourceError::Decode {
        source: raw.to_owned(),
        err,
    })
}

fn render_record_block(
    result_line: &str,
    source: &str,
    node: &str,
    record: &ResultRecord,
) -> String {
    [
        result_line,
        &format!("Source: {source}"),
        &format!("Test Name: {}", record.title),
        &format!("Description: {}", record.description),
        &format!("Test Summary: {}", record.summary_line),
        &format!(
            "Execution Time: {} seconds",
            display_secs(record.duration_secs)
        ),
        &format!("Node: {node}"),
        // Trailing empty entry adds a blank separator line.
        "",
    ]
    .join("\n")
}

/// Writes one line to a console stream, flushing immediately. Console
/// write failures are deliberately swallowed; the log files carry the
/// authoritative copy.
fn console(writer: &mut dyn Write, text: &str) {
    let _ = writeln!(writer, "{text}");
    let _ = writer.flush();
}
