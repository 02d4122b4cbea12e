// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `gossamer` runs.
///
/// A run may qualify for more than one of these at once (for example, a test
/// failure in one source and an unreachable endpoint in another). In that
/// case the highest applicable code wins.
pub enum GossamerExitCode {}

impl GossamerExitCode {
    /// Every source was processed and every test passed.
    pub const OK: i32 = 0;

    /// At least one test failed, and no unexpected errors occurred.
    pub const TEST_FAILURES: i32 = 1;

    /// Invalid invocation: duplicate sources, more than one stdin source, or
    /// a file source that does not exist. Reported before any test
    /// execution begins.
    pub const USAGE_ERROR: i32 = 2;

    /// Something went wrong beyond test failures: a fetch or subprocess
    /// failure, a malformed result document, an unknown result code, or an
    /// internal error.
    pub const UNEXPECTED_ERROR: i32 = 3;
}
