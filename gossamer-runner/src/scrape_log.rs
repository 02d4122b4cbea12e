// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The machine-scraped results log.
//!
//! Downstream log-scraping infrastructure consumes this file line by line;
//! each line is one self-contained JSON object. Field order is part of the
//! contract: `log_timestamp`, `Product`, `log_script`, and `log_message`
//! come first, in that order, followed by any call-site fields in ascending
//! lexical order.

use crate::{config::RunnerLayout, errors::RunLogError};
use camino::Utf8PathBuf;
use chrono::{SecondsFormat, Utc};
use std::{
    fs::{self, File},
    io::Write,
};
use tracing::{error, warn};

const FIXED_FIELDS: [&str; 4] = ["log_timestamp", "Product", "log_script", "log_message"];

/// Sort key giving the four fixed fields their positions and everything
/// else a lexical ordering after them.
fn field_order_key(name: &str) -> (usize, &str) {
    let position = FIXED_FIELDS
        .iter()
        .position(|fixed| *fixed == name)
        .map_or(FIXED_FIELDS.len() + 1, |index| index + 1);
    (position, name)
}

/// Writer for the scrape log. Like the full-output file, a write failure
/// disables the log rather than aborting the run.
#[derive(Debug)]
pub struct ScrapeLog {
    file: Option<File>,
    path: Utf8PathBuf,
    script: String,
    product: String,
}

impl ScrapeLog {
    /// Opens this run's scrape log under the layout's scrape-log directory,
    /// reusing the run directory's unique stem.
    pub fn create(
        layout: &RunnerLayout,
        script_name: &str,
        stem: &str,
    ) -> Result<Self, RunLogError> {
        fs::create_dir_all(&layout.scrape_log_dir).map_err(|err| RunLogError::CreateDir {
            dir: layout.scrape_log_dir.clone(),
            err,
        })?;
        let path = layout.scrape_log_dir.join(format!("{script_name}-{stem}.log"));
        let file = File::create(&path).map_err(|err| RunLogError::CreateFile {
            path: path.clone(),
            err,
        })?;
        Ok(Self {
            file: Some(file),
            path,
            script: script_name.to_owned(),
            product: layout.product.clone(),
        })
    }

    /// A scrape log that discards everything. Used when driving the
    /// pipeline from tests.
    pub fn sink() -> Self {
        Self {
            file: None,
            path: Utf8PathBuf::from("/dev/null"),
            script: "gossamer".to_owned(),
            product: "CSM".to_owned(),
        }
    }

    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }

    /// Appends one record with the given message and call-site fields.
    pub fn record(&mut self, message: &str, data: &[(&str, serde_json::Value)]) {
        let line = self.render_line(message, data);
        let Some(file) = &mut self.file else {
            return;
        };
        if let Err(err) = writeln!(file, "{line}").and_then(|()| file.flush()) {
            let msg = format!("error writing to scrape log {}: {err}", self.path);
            error!("{msg}");
            eprintln!("{msg}");
            self.file = None;
        }
    }

    fn render_line(&self, message: &str, data: &[(&str, serde_json::Value)]) -> String {
        let mut fields: Vec<(&str, serde_json::Value)> = Vec::with_capacity(data.len() + 4);
        for (name, value) in data {
            if FIXED_FIELDS.contains(name) {
                warn!(
                    "scrape log field `{name}` already set to `{value}`; \
                     overwriting it with the fixed value"
                );
                continue;
            }
            fields.push((*name, value.clone()));
        }
        fields.extend([
            (
                "log_timestamp",
                Utc::now()
                    .to_rfc3339_opts(SecondsFormat::Micros, true)
                    .into(),
            ),
            ("Product", self.product.as_str().into()),
            ("log_script", self.script.as_str().into()),
            ("log_message", message.into()),
        ]);
        fields.sort_by(|(a, _), (b, _)| field_order_key(a).cmp(&field_order_key(b)));

        let mut line = String::from("{");
        for (index, (name, value)) in fields.iter().enumerate() {
            if index > 0 {
                line.push(',');
            }
            line.push_str(&serde_json::to_string(name).expect("string keys serialize"));
            line.push(':');
            line.push_str(&serde_json::to_string(value).expect("JSON values serialize"));
        }
        line.push('}');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixed_fields_come_first_then_lexical() {
        let log = ScrapeLog::sink();
        let line = log.render_line(
            "test result",
            &[
                ("test_name", json!("dns-resolution")),
                ("Result", json!("PASS")),
                ("node", json!("ncn-w001")),
            ],
        );

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 7);

        // serde_json's map loses insertion order, so check ordering on the
        // raw text.
        let positions: Vec<usize> = [
            "\"log_timestamp\"",
            "\"Product\"",
            "\"log_script\"",
            "\"log_message\"",
            "\"Result\"",
            "\"node\"",
            "\"test_name\"",
        ]
        .iter()
        .map(|key| line.find(key).unwrap_or_else(|| panic!("{key} missing")))
        .collect();
        assert!(
            positions.is_sorted(),
            "fields out of order in line: {line}"
        );
    }

    #[test]
    fn caller_cannot_override_fixed_fields() {
        let log = ScrapeLog::sink();
        let line = log.render_line("real message", &[("log_message", json!("spoofed"))]);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["log_message"], "real message");
    }
}
