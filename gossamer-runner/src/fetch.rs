// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Obtaining raw result documents from remote and local-invocation sources.
//!
//! Every failure here is converted into an error outcome for the one source
//! involved; nothing in this module propagates an error to the caller or
//! aborts the rest of a run.

use crate::{config::RunnerLayout, source::Source};
use camino::Utf8PathBuf;
use duct::cmd;
use tracing::{debug, error, info};
use ureq::Agent;

/// The result of obtaining one raw document: either a decoded JSON value or
/// a description of what went wrong. Extraction and tallying happen later,
/// on the aggregation thread.
#[derive(Clone, Debug)]
pub enum FetchOutcome {
    Document(serde_json::Value),
    Error(String),
}

/// Obtains raw result documents. One instance is shared (immutably) by all
/// collection workers.
#[derive(Debug)]
pub struct Fetcher {
    agent: Agent,
    runner_program: Utf8PathBuf,
    runner_vars: Option<Utf8PathBuf>,
}

impl Fetcher {
    pub fn new(layout: &RunnerLayout) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(layout.request_timeout))
            // 503 is a legitimate response carrying a result document with
            // failures; decode the body rather than erroring on status.
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            runner_program: layout.runner_program.clone(),
            runner_vars: layout.runner_vars.clone(),
        }
    }

    /// Produces the outcome for one remote or local-invocation source.
    ///
    /// # Panics
    ///
    /// Panics if called with a results-file or stdin source; those are read
    /// directly by the aggregation phase.
    pub fn fetch(&self, source: &Source) -> FetchOutcome {
        match source {
            Source::RemoteEndpoint { raw, .. } => self.fetch_url(raw),
            Source::LocalInvocation { raw, resolved } => self.run_suite(raw, resolved),
            Source::ResultsFile { .. } | Source::Stdin { .. } => {
                panic!("fetch called with non-collectable source {:?}", source.raw())
            }
        }
    }

    fn fetch_url(&self, url: &str) -> FetchOutcome {
        info!("making GET request to {url}");
        let mut response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(err) => {
                error!("unexpected error attempting GET request to {url}: {err}");
                return FetchOutcome::Error(format!(
                    "unexpected error attempting GET request to {url}: {err}"
                ));
            }
        };

        let status = response.status();
        debug!(url, status = status.as_u16(), "response received");
        let body = match response.body_mut().read_to_string() {
            Ok(body) => body,
            Err(err) => {
                error!("unexpected error reading response body from {url}: {err}");
                return FetchOutcome::Error(format!(
                    "unexpected error reading response body from {url}: {err}"
                ));
            }
        };

        // Expected responses are 200 (no tests failed) or 503 (either test
        // failures, or another runner issue such as syntax errors in the
        // test definitions; the body disambiguates).
        if !matches!(status.as_u16(), 200 | 503) {
            let err_msg = format!("status code {status} received from {url}: {body}");
            error!("{err_msg}");
            return FetchOutcome::Error(err_msg);
        }

        info!("decoding JSON response body from {url}");
        match serde_json::from_str(&body) {
            Ok(document) => {
                info!("successfully decoded JSON response from {url}");
                FetchOutcome::Document(document)
            }
            Err(err) => {
                error!("unexpected error decoding JSON response from {url}: {err}");
                debug!(url, body = %body, "undecodable response body");
                FetchOutcome::Error(format!(
                    "unexpected error decoding JSON response from {url}: {err}"
                ))
            }
        }
    }

    fn run_suite(&self, raw: &str, resolved: &Utf8PathBuf) -> FetchOutcome {
        let mut args: Vec<String> = Vec::new();
        if let Some(vars) = &self.runner_vars {
            args.extend(["--vars".to_owned(), vars.to_string()]);
        }
        args.extend([
            "-g".to_owned(),
            resolved.to_string(),
            "validate".to_owned(),
            "-f".to_owned(),
            "json".to_owned(),
        ]);

        info!("running {} {}", self.runner_program, args.join(" "));
        let output = match cmd(self.runner_program.as_str(), &args)
            // Capture stdout and stderr separately; a non-zero exit just
            // means test failures occurred, so don't treat it as an error.
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
        {
            Ok(output) => output,
            Err(err) => {
                error!("failed to execute {} for {raw}: {err}", self.runner_program);
                return FetchOutcome::Error(format!(
                    "failed to execute {} for {raw}: {err}",
                    self.runner_program
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str(&stdout) {
            Ok(document) => FetchOutcome::Document(document),
            Err(err) => {
                let exit_code = output
                    .status
                    .code()
                    .map_or_else(|| "none".to_owned(), |code| code.to_string());
                let stderr = String::from_utf8_lossy(&output.stderr);
                error!(
                    "undecodable runner output for {raw} (exit code {exit_code}): {err}; \
                     stderr: {stderr}"
                );
                FetchOutcome::Error(format!(
                    "error decoding JSON output of {} for {raw} (exit code {exit_code}): {err}",
                    self.runner_program
                ))
            }
        }
    }
}
