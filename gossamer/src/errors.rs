// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use camino::Utf8PathBuf;
use gossamer_metadata::GossamerExitCode;
use gossamer_runner::{
    errors::{LayoutError, PoolBuildError, RunLogError, SourceClassifyError},
    helpers::display_error_chain,
};
use owo_colors::OwoColorize;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// A failure with a documented exit code, as opposed to a gossamer bug.
///
/// Test failures are not errors: they flow through the tally and
/// [`final_status`](gossamer_runner::report::Reporter::final_status).
/// These variants cover everything that stops a run before reporting.
#[derive(Debug, Error)]
pub enum ExpectedError {
    #[error("usage error")]
    UsageError {
        #[from]
        err: SourceClassifyError,
    },

    #[error("error resolving runner layout")]
    LayoutError {
        #[from]
        err: LayoutError,
    },

    #[error("error setting up run logs")]
    RunLogSetupError {
        #[from]
        err: RunLogError,
    },

    #[error("error creating debug log {path}")]
    DebugLogCreate {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("error building worker pool")]
    PoolBuildError {
        #[from]
        err: PoolBuildError,
    },
}

impl ExpectedError {
    /// The exit code for this error.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::UsageError { .. } => GossamerExitCode::USAGE_ERROR,
            Self::LayoutError { .. }
            | Self::RunLogSetupError { .. }
            | Self::DebugLogCreate { .. }
            | Self::PoolBuildError { .. } => GossamerExitCode::UNEXPECTED_ERROR,
        }
    }

    /// Displays this error to stderr, ending with the FAILED line the
    /// log-tailing contract requires.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let message = match self {
            Self::UsageError { err } => display_error_chain(err),
            Self::LayoutError { err } => display_error_chain(err),
            Self::RunLogSetupError { err } => display_error_chain(err),
            Self::DebugLogCreate { .. } => display_error_chain(self),
            Self::PoolBuildError { err } => display_error_chain(err),
        };
        eprintln!("{}", format!("ERROR: {message}").style(styles.error));
        match self {
            Self::UsageError { .. } => {
                eprintln!("{}", "FAILED (usage)".style(styles.error));
            }
            _ => {
                eprintln!("{}", "\nFAILED".style(styles.error));
            }
        }
    }
}
