// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared definitions for gossamer's external contracts: the process exit
//! codes, and the serde model of the JSON result documents emitted by the
//! goss test runner.
//!
//! This crate is intentionally small so that harnesses which invoke
//! `gossamer` (or consume the same result documents) can depend on it
//! without pulling in the aggregation pipeline.

mod exit_codes;
mod result_document;

pub use exit_codes::GossamerExitCode;
pub use result_document::{DocumentSummary, EntryMeta, RawResultEntry, ResultDocument};
