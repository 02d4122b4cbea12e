// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for gossamer-runner.

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "source" if `count` is 1, otherwise "sources".
    pub fn sources_str(count: usize) -> &'static str {
        if count == 1 { "source" } else { "sources" }
    }
}

/// Formats a duration in seconds the way result blocks and summary lines
/// print it.
pub fn display_secs(secs: f64) -> String {
    format!("{secs:.8}")
}

/// Formats an error with its full source chain on one line.
pub fn display_error_chain(err: &dyn std::error::Error) -> String {
    std::iter::successors(Some(err), |err| err.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_secs_has_eight_decimal_places() {
        assert_eq!(display_secs(1.5), "1.50000000");
        assert_eq!(display_secs(0.000000001), "0.00000000");
    }
}
