// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::Result,
    output::{Color, StderrStyles},
};
use clap::{Parser, error::ErrorKind};
use gossamer_metadata::GossamerExitCode;
use gossamer_runner::{
    config::RunnerLayout,
    engine::CollectionPool,
    fetch::Fetcher,
    helpers::plural,
    report::{Reporter, Styles, run_collection},
    run_log::{OutputLog, RunPaths},
    scrape_log::ScrapeLog,
    source::classify_sources,
};
use owo_colors::OwoColorize;
use std::io::{Read, Write};
use tracing::{debug, info};

/// Name under which run logs and scrape-log records are filed.
const SCRIPT_NAME: &str = "gossamer";

/// Summarize JSON-format goss test results with pretty colors.
///
/// One or more sources of test results are passed in.
///
/// If a source begins with "http://" or "https://", it is taken to be a
/// goss endpoint, and a GET request is made to obtain the test results. The
/// node name shown next to the results is extracted from the URL.
///
/// If a source is "stdin" (optionally "stdin:<label>"), the test results
/// are read from standard input. At most one stdin source is permitted.
///
/// If a source matches "suites/<name>.yaml" or "tests/<name>.yaml", it is
/// resolved against the runner base directory and executed with the local
/// runner to produce results.
///
/// Otherwise, the source is taken to be a file containing test results in
/// JSON format.
///
/// As each source is processed, failures are displayed along with a
/// per-source summary line; a grand-total summary is printed at the end.
/// Full results (including passes) go to a per-run output file whose
/// location is printed at startup.
///
/// Exit codes: 0 all tests passed; 1 at least one test failed; 2 usage
/// error; 3 other error. If multiple exit codes apply, the highest one is
/// used.
#[derive(Debug, Parser)]
#[command(name = "gossamer", version)]
pub struct GossamerApp {
    /// Sources for test results.
    #[arg(value_name = "SOURCE", required = true)]
    sources: Vec<String>,
}

impl GossamerApp {
    /// Parses the command line, printing the usage message and the
    /// `FAILED (usage)` line (and exiting with the usage code) on bad
    /// arguments. Help and version requests exit normally.
    pub fn parse_or_exit(styles: &StderrStyles) -> Self {
        match Self::try_parse() {
            Ok(app) => app,
            Err(err) => {
                if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                    err.exit();
                }
                // A usage message will already have been composed by clap.
                let _ = err.print();
                eprintln!("{}", "FAILED (usage)".style(styles.error));
                std::process::exit(GossamerExitCode::USAGE_ERROR);
            }
        }
    }

    /// Executes the run against the given layout, returning the process
    /// exit code.
    ///
    /// The console and stdin handles are injected so tests can drive a
    /// full run with captured output.
    pub fn exec(
        self,
        layout: RunnerLayout,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        stdin: &mut dyn Read,
    ) -> Result<i32> {
        // Usage validation happens before any logging or execution so bad
        // invocations leave nothing behind.
        let sources = classify_sources(&self.sources, &layout.base_dir)?;

        let paths = RunPaths::create(&layout, SCRIPT_NAME)?;
        crate::output::init_debug_log(&paths.debug_log)?;
        info!(
            "called with {} {}: {}",
            self.sources.len(),
            plural::sources_str(self.sources.len()),
            self.sources.join(" ")
        );
        debug!(?layout, "resolved runner layout");

        let mut out = OutputLog::create(&paths.output_file)?;
        out.line(&format!("Script debug log file: {}", paths.debug_log));
        let scrape = ScrapeLog::create(&layout, SCRIPT_NAME, &paths.stem)?;
        debug!(scrape_log = %scrape.path(), "scrape log open");

        let _ = writeln!(stdout, "Writing full output to {}\n", paths.output_file);
        let _ = stdout.flush();

        let color = Color::from_env();
        let styles = if color.should_colorize(supports_color::Stream::Stderr) {
            Styles::colorized()
        } else {
            Styles::plain()
        };

        let mut reporter = Reporter::new(styles, out, scrape, Some(paths.debug_log.clone()));
        let pool = CollectionPool::new(layout.pool_size)?;
        let fetcher = Fetcher::new(&layout);

        run_collection(
            &sources,
            &pool,
            |source| fetcher.fetch(source),
            stdin,
            &mut reporter,
            stdout,
            stderr,
        );

        Ok(reporter.final_status(stdout, stderr))
    }
}
