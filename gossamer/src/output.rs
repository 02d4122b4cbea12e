// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console color handling and debug-log initialization.
//!
//! The CLI surface is sources-only, so unlike most tools everything here is
//! driven by the environment: `GOSSAMER_COLOR` selects colorization and
//! `GOSSAMER_LOG` sets the debug-log filter.

use crate::errors::ExpectedError;
use camino::Utf8Path;
use owo_colors::{Style, style};
use std::{fs::File, sync::Arc};
use tracing_subscriber::{
    Layer,
    filter::{LevelFilter, Targets},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Colorize console output: auto, always, never.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

impl Color {
    /// Reads `GOSSAMER_COLOR`. Unrecognized values fall back to auto.
    pub fn from_env() -> Self {
        match std::env::var("GOSSAMER_COLOR").as_deref() {
            Ok("always") => Self::Always,
            Ok("never") => Self::Never,
            _ => Self::Auto,
        }
    }

    pub fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Self::Auto => supports_color::on_cached(stream).is_some(),
            Self::Always => true,
            Self::Never => false,
        }
    }

    /// Styles for stderr messages printed by the CLI itself (usage and
    /// setup failures).
    pub fn stderr_styles(self) -> StderrStyles {
        let mut styles = StderrStyles::default();
        if self.should_colorize(supports_color::Stream::Stderr) {
            styles.colorize();
        }
        styles
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StderrStyles {
    pub(crate) error: Style,
}

impl StderrStyles {
    fn colorize(&mut self) {
        self.error = style().bright_red();
    }
}

static INIT_LOGGER: std::sync::Once = std::sync::Once::new();

/// Routes tracing output to the per-run debug log file.
///
/// The filter comes from `GOSSAMER_LOG` (a tracing `Targets` string),
/// defaulting to INFO. Only the first call in a process installs the
/// subscriber; later calls still create the file so the path reported at
/// startup always exists.
pub fn init_debug_log(debug_log: &Utf8Path) -> Result<(), ExpectedError> {
    let file = File::create(debug_log).map_err(|err| ExpectedError::DebugLogCreate {
        path: debug_log.to_path_buf(),
        err,
    })?;

    INIT_LOGGER.call_once(|| {
        let level_str = std::env::var("GOSSAMER_LOG").unwrap_or_default();

        // If the level string is empty, use the standard level filter
        // instead.
        let targets = if level_str.is_empty() {
            Targets::new().with_default(LevelFilter::INFO)
        } else {
            level_str.parse().expect("unable to parse GOSSAMER_LOG")
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .with_filter(targets);

        tracing_subscriber::registry().with(layer).init();
    });

    Ok(())
}
