// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runner layout and tuning, resolved from the environment.
//!
//! Everything the pipeline needs from the environment is resolved once, up
//! front, into a [`RunnerLayout`] that is passed down explicitly. Modules
//! never consult the environment themselves.

use crate::errors::{LayoutError, PoolSizeParseError};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, str::FromStr, sync::LazyLock, time::Duration};
use tracing::warn;

/// Default install base directory when neither `GOSS_BASE` nor
/// `GOSS_INSTALL_BASE_DIR` is set.
pub const DEFAULT_INSTALL_BASE_DIR: &str = "/opt/cray/tests/install";

/// Marker file that identifies the pre-install toolkit node. Its presence
/// selects the `livecd` runner base directory instead of `ncn`.
const PIT_RELEASE_FILE: &str = "/etc/pit-release";

/// Default number of collection workers when `GOSSAMER_THREADS` is unset.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Default per-request timeout in seconds when `GOSSAMER_TIMEOUT` is unset.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Resolved directory layout and tuning for one run.
#[derive(Clone, Debug)]
pub struct RunnerLayout {
    /// Base directory of the test installation.
    pub install_base_dir: Utf8PathBuf,
    /// Base directory for the runner's suite and test definitions.
    pub base_dir: Utf8PathBuf,
    /// Base directory under which per-run log directories are created.
    pub log_base_dir: Utf8PathBuf,
    /// Directory for the machine-scraped results log.
    pub scrape_log_dir: Utf8PathBuf,
    /// The external runner program invoked for local suite sources.
    pub runner_program: Utf8PathBuf,
    /// Optional vars file passed to the runner with `--vars`.
    pub runner_vars: Option<Utf8PathBuf>,
    /// Product tag recorded in scrape-log entries.
    pub product: String,
    /// Size of the parallel collection worker pool.
    pub pool_size: PoolSize,
    /// Timeout applied to each remote request.
    pub request_timeout: Duration,
}

impl RunnerLayout {
    /// Resolves the layout from the environment.
    pub fn from_env() -> Result<Self, LayoutError> {
        let base_env = env_path("GOSS_BASE");
        let install_base_dir = match (env_path("GOSS_INSTALL_BASE_DIR"), &base_env) {
            (Some(dir), _) => dir,
            (None, Some(base)) => base
                .parent()
                .unwrap_or(Utf8Path::new("/"))
                .to_path_buf(),
            (None, None) => DEFAULT_INSTALL_BASE_DIR.into(),
        };
        let base_dir = base_env.unwrap_or_else(|| {
            let flavor = if Utf8Path::new(PIT_RELEASE_FILE).is_file() {
                "livecd"
            } else {
                "ncn"
            };
            install_base_dir.join(flavor)
        });
        let log_base_dir =
            env_path("GOSS_LOG_BASE_DIR").unwrap_or_else(|| install_base_dir.join("logs"));
        let scrape_log_dir = env_path("GOSSAMER_SCRAPE_LOG_DIR")
            .unwrap_or_else(|| install_base_dir.join("logs/scrape"));

        let pool_size = match std::env::var("GOSSAMER_THREADS") {
            Ok(value) => value.parse().map_err(|err| LayoutError::PoolSizeParse {
                var: "GOSSAMER_THREADS",
                err,
            })?,
            Err(_) => PoolSize::Count(DEFAULT_POOL_SIZE),
        };
        let request_timeout = match std::env::var("GOSSAMER_TIMEOUT") {
            Ok(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(LayoutError::TimeoutParse {
                        var: "GOSSAMER_TIMEOUT",
                        value,
                    });
                }
            },
            Err(_) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            install_base_dir,
            base_dir,
            log_base_dir,
            scrape_log_dir,
            runner_program: env_path("GOSS_PATH").unwrap_or_else(|| "goss".into()),
            runner_vars: env_path("GOSS_VARS"),
            product: std::env::var("GOSSAMER_PRODUCT").unwrap_or_else(|_| "CSM".to_owned()),
            pool_size,
            request_timeout,
        })
    }
}

fn env_path(var: &str) -> Option<Utf8PathBuf> {
    std::env::var(var).ok().map(Utf8PathBuf::from)
}

/// Size of the parallel collection worker pool.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PoolSize {
    /// A fixed number of workers.
    Count(usize),
    /// Defer to the platform default (one worker per logical CPU).
    Default,
}

impl PoolSize {
    /// The value to hand to the pool builder: 0 means "use the platform
    /// default".
    pub fn num_threads(self) -> usize {
        match self {
            Self::Count(threads) => threads,
            Self::Default => 0,
        }
    }
}

impl FromStr for PoolSize {
    type Err = PoolSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(Self::Default);
        }

        match s.parse::<isize>() {
            Err(e) => Err(PoolSizeParseError::new(format!("Error: {e} parsing {s}"))),
            Ok(0) => Err(PoolSizeParseError::new(
                "pool size may not be 0 (use `default` for the platform default)",
            )),
            Ok(j) if j < 0 => Ok(PoolSize::Count(
                (get_num_cpus() as isize + j).max(1) as usize,
            )),
            Ok(j) => Ok(PoolSize::Count(j as usize)),
        }
    }
}

impl fmt::Display for PoolSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(threads) => write!(f, "{threads}"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Gets the number of available CPUs and caches the value.
#[inline]
pub fn get_num_cpus() -> usize {
    static NUM_CPUS: LazyLock<usize> =
        LazyLock::new(|| match std::thread::available_parallelism() {
            Ok(count) => count.into(),
            Err(err) => {
                warn!("unable to determine num-cpus ({err}), assuming 1 logical CPU");
                1
            }
        });

    *NUM_CPUS
}

/// The local hostname, used to label file, stdin, and local-invocation
/// sources. Resolved once per process.
pub fn local_hostname() -> &'static str {
    static HOSTNAME: LazyLock<String> = LazyLock::new(|| match whoami::hostname() {
        Ok(hostname) => hostname,
        Err(err) => {
            warn!("unable to determine local hostname ({err}), using `localhost`");
            "localhost".to_owned()
        }
    });

    &HOSTNAME
}
