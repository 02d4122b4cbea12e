// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by gossamer-runner.

use camino::Utf8PathBuf;
use itertools::Itertools;
use thiserror::Error;

/// A usage error detected while classifying the input sources.
///
/// All of these are reported before any test execution begins.
#[derive(Debug, Error)]
pub enum SourceClassifyError {
    /// The same source string was supplied more than once.
    #[error("duplicate sources are not permitted, invalid arguments: {}", .sources.iter().join(" "))]
    DuplicateSources {
        /// The full source list as given.
        sources: Vec<String>,
    },

    /// More than one stdin source was supplied.
    #[error("at most one stdin source is permitted, got: {first} and {second}")]
    MultipleStdinSources { first: String, second: String },

    /// A file source does not exist on disk.
    #[error("file source does not exist: {input}")]
    FileSourceMissing { input: String },

    /// A suite source did not resolve to a file on disk.
    #[error("suite source does not exist: {input} (resolved to {resolved})")]
    SuiteSourceMissing {
        input: String,
        resolved: Utf8PathBuf,
    },
}

/// An error resolving the runner layout from the environment.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("error parsing {var}: {err}")]
    PoolSizeParse {
        var: &'static str,
        err: PoolSizeParseError,
    },

    #[error("error parsing {var}: expected a positive number of seconds, got `{value}`")]
    TimeoutParse { var: &'static str, value: String },
}

/// An error returned while parsing a worker-pool size.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct PoolSizeParseError {
    message: String,
}

impl PoolSizeParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An error obtaining a raw result document from a file or stdin source.
#[derive(Debug, Error)]
pub enum ReadSourceError {
    #[error("problem reading input file {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("problem reading standard input")]
    Stdin {
        #[source]
        err: std::io::Error,
    },

    #[error("error decoding JSON from {source}")]
    Decode {
        source: String,
        #[source]
        err: serde_json::Error,
    },
}

/// A result document was obtained but fails shape validation.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document or one of its selected entries does not match the
    /// expected shape (missing keys, wrong types).
    #[error("test results have unexpected format")]
    UnexpectedFormat {
        #[source]
        err: serde_json::Error,
    },

    /// A result entry has no `result` field at all.
    #[error("result entry {index} has no `result` field")]
    EntryMissingResult { index: usize },

    /// The document was structurally valid but contained no entries with a
    /// numeric result code. An empty document is not a vacuous pass.
    #[error("no test results found")]
    NoResults,
}

/// An error creating the per-run log directory or one of the log files.
#[derive(Debug, Error)]
pub enum RunLogError {
    #[error("error creating log directory {dir}")]
    CreateDir {
        dir: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("error creating log file {path}")]
    CreateFile {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
}

/// An error building the worker pool for the parallel collection phase.
#[derive(Debug, Error)]
#[error("error building collection worker pool")]
pub struct PoolBuildError {
    #[from]
    source: rayon::ThreadPoolBuildError,
}
