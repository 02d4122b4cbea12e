// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-run log files.
//!
//! Every run creates a fresh directory under the log base directory,
//! containing `log` (the debug log, written via tracing) and `out` (the
//! full results output, including passing tests that are not shown on
//! screen). The directory name embeds a timestamp, the pid, and a random
//! suffix so that concurrent runs never collide; creation fails rather than
//! reusing an existing directory.

use crate::{config::RunnerLayout, errors::RunLogError};
use camino::Utf8PathBuf;
use chrono::Local;
use rand::{RngExt, distr::Alphanumeric};
use std::{
    fs::{self, File},
    io::Write,
};
use tracing::error;

/// The on-disk locations of one run's logs.
#[derive(Clone, Debug)]
pub struct RunPaths {
    /// The per-run directory.
    pub dir: Utf8PathBuf,
    /// The debug log file inside it.
    pub debug_log: Utf8PathBuf,
    /// The full-output file inside it.
    pub output_file: Utf8PathBuf,
    /// The unique stem of the directory name, reused for the scrape log.
    pub stem: String,
}

impl RunPaths {
    /// Allocates the per-run directory for `script_name` under the layout's
    /// log base directory.
    pub fn create(layout: &RunnerLayout, script_name: &str) -> Result<Self, RunLogError> {
        let script_dir = layout.log_base_dir.join(script_name);
        fs::create_dir_all(&script_dir).map_err(|err| RunLogError::CreateDir {
            dir: script_dir.clone(),
            err,
        })?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S%.6f");
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let stem = format!("{timestamp}-{}-{suffix}", std::process::id());
        let dir = script_dir.join(&stem);

        // A collision means something is reusing our unique name; fail
        // rather than mixing two runs' output.
        fs::create_dir(&dir).map_err(|err| RunLogError::CreateDir {
            dir: dir.clone(),
            err,
        })?;

        Ok(Self {
            debug_log: dir.join("log"),
            output_file: dir.join("out"),
            dir,
            stem,
        })
    }
}

/// The full-output file.
///
/// A write failure is reported once (stderr and debug log) and permanently
/// disables the file; output written afterwards is silently dropped. Losing
/// the verbose copy must never abort a run.
#[derive(Debug)]
pub struct OutputLog {
    file: Option<File>,
    path: Utf8PathBuf,
}

impl OutputLog {
    pub fn create(path: &Utf8PathBuf) -> Result<Self, RunLogError> {
        let file = File::create(path).map_err(|err| RunLogError::CreateFile {
            path: path.clone(),
            err,
        })?;
        Ok(Self {
            file: Some(file),
            path: path.clone(),
        })
    }

    /// An output log that discards everything. Used when driving the
    /// pipeline from tests.
    pub fn sink() -> Self {
        Self {
            file: None,
            path: Utf8PathBuf::from("/dev/null"),
        }
    }

    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }

    /// Appends one line.
    pub fn line(&mut self, text: &str) {
        let Some(file) = &mut self.file else {
            return;
        };
        if let Err(err) = writeln!(file, "{text}").and_then(|()| file.flush()) {
            let msg = format!("error writing to output file {}: {err}", self.path);
            error!("{msg}");
            eprintln!("{msg}");
            self.file = None;
        }
    }
}
