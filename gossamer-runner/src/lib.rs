// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core implementation logic for gossamer.
//!
//! gossamer aggregates JSON result documents produced by the goss test
//! runner. Result documents are obtained from local files, piped standard
//! input, remote goss endpoints, and local suite invocations; remote and
//! local-invocation sources are collected concurrently on a bounded worker
//! pool. Every source's outcome is reported in the original input order,
//! tallied, and summarized with a strict exit-code contract.
//!
//! For the command-line interface, see the `gossamer` crate.

pub mod config;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod helpers;
pub mod report;
pub mod results;
pub mod run_log;
pub mod scrape_log;
pub mod source;
