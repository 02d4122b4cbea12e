// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The gossamer CLI: aggregates goss JSON result documents from files,
//! stdin, remote endpoints, and local suite invocations.
//!
//! The binary entry point is thin; integration tests drive runs through
//! [`GossamerApp::exec`] with injected console handles.

mod dispatch;
mod errors;
mod output;

pub use dispatch::GossamerApp;
pub use errors::ExpectedError;
pub use output::{Color, StderrStyles};
