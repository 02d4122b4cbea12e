// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input source classification.
//!
//! Each command-line source string names one origin of a result document.
//! Classification is purely syntactic, and all usage errors (duplicates,
//! more than one stdin source, missing files) are detected here, before any
//! test executes.

use crate::{config::local_hostname, errors::SourceClassifyError};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::{collections::HashSet, sync::LazyLock};

/// Pattern for sources that are executed as a local runner invocation
/// rather than read from disk.
static SUITE_SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(suites|tests)/[^/]+\.yaml$").expect("suite source regex is valid")
});

/// One user-supplied input descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// A JSON result document already on disk.
    ResultsFile { raw: String, path: Utf8PathBuf },

    /// Result document piped on standard input, with an optional display
    /// label. At most one of these per run.
    Stdin {
        raw: String,
        label: Option<String>,
    },

    /// A remote goss endpoint to GET.
    RemoteEndpoint { raw: String, node: String },

    /// A suite or test definition to execute with the local runner.
    LocalInvocation {
        raw: String,
        resolved: Utf8PathBuf,
    },
}

impl Source {
    /// The source string exactly as the user supplied it. Unique within a
    /// run, and used as the identity key for collected outcomes.
    pub fn raw(&self) -> &str {
        match self {
            Self::ResultsFile { raw, .. }
            | Self::Stdin { raw, .. }
            | Self::RemoteEndpoint { raw, .. }
            | Self::LocalInvocation { raw, .. } => raw,
        }
    }

    /// The node name shown next to this source's results: the endpoint host
    /// for remote sources, the local hostname for everything else.
    pub fn node(&self) -> &str {
        match self {
            Self::RemoteEndpoint { node, .. } => node,
            _ => local_hostname(),
        }
    }
}

/// The classified sources of one run, partitioned by processing phase.
/// Order within each bucket is the original input order.
#[derive(Clone, Debug, Default)]
pub struct SourceList {
    /// Results files, processed sequentially first.
    pub files: Vec<Source>,
    /// Remote endpoints and local invocations, collected concurrently.
    pub parallel: Vec<Source>,
    /// The stdin source, if any, processed last.
    pub stdin: Option<Source>,
}

impl SourceList {
    /// Total number of sources.
    pub fn len(&self) -> usize {
        self.files.len() + self.parallel.len() + usize::from(self.stdin.is_some())
    }

    /// True if no sources were supplied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions the raw source strings into a [`SourceList`].
///
/// Fails fast on duplicate sources, more than one stdin source, or a file
/// or suite source that does not exist on disk. `base_dir` anchors suite
/// source resolution.
pub fn classify_sources(
    raw_sources: &[String],
    base_dir: &Utf8Path,
) -> Result<SourceList, SourceClassifyError> {
    let mut seen = HashSet::new();
    for raw in raw_sources {
        if !seen.insert(raw.as_str()) {
            return Err(SourceClassifyError::DuplicateSources {
                sources: raw_sources.to_vec(),
            });
        }
    }

    let mut list = SourceList::default();
    for raw in raw_sources {
        if is_url(raw) {
            list.parallel.push(Source::RemoteEndpoint {
                raw: raw.clone(),
                node: node_from_url(raw),
            });
        } else if raw == "stdin" || raw.starts_with("stdin:") {
            let label = raw
                .strip_prefix("stdin:")
                .filter(|label| !label.is_empty())
                .map(str::to_owned);
            if let Some(first) = &list.stdin {
                return Err(SourceClassifyError::MultipleStdinSources {
                    first: first.raw().to_owned(),
                    second: raw.clone(),
                });
            }
            list.stdin = Some(Source::Stdin {
                raw: raw.clone(),
                label,
            });
        } else if SUITE_SOURCE_RE.is_match(raw) {
            let resolved = base_dir.join(raw);
            if !resolved.is_file() {
                return Err(SourceClassifyError::SuiteSourceMissing {
                    input: raw.clone(),
                    resolved,
                });
            }
            list.parallel.push(Source::LocalInvocation {
                raw: raw.clone(),
                resolved,
            });
        } else {
            let path = Utf8PathBuf::from(raw);
            if !path.is_file() {
                return Err(SourceClassifyError::FileSourceMissing {
                    input: raw.clone(),
                });
            }
            list.files.push(Source::ResultsFile {
                raw: raw.clone(),
                path,
            });
        }
    }

    Ok(list)
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Extracts the node name used to label a remote source's results: the text
/// after `//` up to the first period, colon, or slash.
fn node_from_url(url: &str) -> String {
    let host = url.split('/').nth(2).unwrap_or_default();
    match host.find(['.', ':']) {
        Some(end) => host[..end].to_owned(),
        None => host.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use test_case::test_case;

    #[test_case("http://ncn-w001.local:8997/ncn-healthcheck", "ncn-w001")]
    #[test_case("https://ncn-m002:8997/", "ncn-m002")]
    #[test_case("http://gateway/healthz", "gateway")]
    #[test_case("http://10.252.1.4:8998/x", "10")]
    fn node_labels_from_urls(url: &str, expected: &str) {
        assert_eq!(node_from_url(url), expected);
    }

    #[test]
    fn classification_partitions_by_kind() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("results.json");
        std::fs::write(&results, "{}").unwrap();
        std::fs::create_dir(dir.path().join("suites")).unwrap();
        let suite = dir.path().join("suites/ncn-healthcheck.yaml");
        std::fs::write(&suite, "").unwrap();

        let raw = vec![
            results.to_string(),
            "http://ncn-w001:8997/ncn-healthcheck".to_owned(),
            "suites/ncn-healthcheck.yaml".to_owned(),
            "stdin:smoke".to_owned(),
        ];
        let list = classify_sources(&raw, dir.path()).unwrap();

        assert_eq!(list.len(), 4);
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.parallel.len(), 2);
        match &list.parallel[1] {
            Source::LocalInvocation { resolved, .. } => assert_eq!(resolved, &suite),
            other => panic!("expected local invocation, got {other:?}"),
        }
        match &list.stdin {
            Some(Source::Stdin { label, .. }) => assert_eq!(label.as_deref(), Some("smoke")),
            other => panic!("expected stdin source, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_sources_are_rejected() {
        let raw = vec!["stdin".to_owned(), "stdin".to_owned()];
        let err = classify_sources(&raw, Utf8Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(
            err,
            SourceClassifyError::DuplicateSources { .. }
        ));
    }

    #[test]
    fn two_distinct_stdin_sources_are_rejected() {
        let raw = vec!["stdin".to_owned(), "stdin:labeled".to_owned()];
        let err = classify_sources(&raw, Utf8Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(
            err,
            SourceClassifyError::MultipleStdinSources { .. }
        ));
    }

    #[test]
    fn missing_results_file_is_a_usage_error() {
        let raw = vec!["definitely/not/here.json".to_owned()];
        let err = classify_sources(&raw, Utf8Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, SourceClassifyError::FileSourceMissing { .. }));
    }

    #[test]
    fn suite_pattern_requires_single_path_segment() {
        let dir = tempdir().unwrap();
        // Nested paths do not match the suite pattern, so this is treated as
        // a (missing) results file.
        let raw = vec!["suites/nested/dir.yaml".to_owned()];
        let err = classify_sources(&raw, dir.path()).unwrap_err();
        assert!(matches!(err, SourceClassifyError::FileSourceMissing { .. }));
    }
}
