// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent collection of remote and local-invocation sources.
//!
//! Collection fans each source out to a bounded pool of OS threads and joins
//! before returning: every worker makes exactly one lock-protected write
//! into the outcome map, and the map is not read until all workers have
//! finished. Workers are fully independent; one source failing or hanging
//! never cancels or delays the others beyond pool scheduling.

use crate::{config::PoolSize, errors::PoolBuildError, fetch::FetchOutcome, source::Source};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{collections::HashMap, sync::Mutex};
use tracing::debug;

/// The worker pool for the parallel collection phase.
pub struct CollectionPool {
    pool: ThreadPool,
}

impl CollectionPool {
    /// Builds the pool. A [`PoolSize::Default`] size defers to the
    /// platform default (one thread per logical CPU).
    pub fn new(size: PoolSize) -> Result<Self, PoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(size.num_threads())
            .thread_name(|idx| format!("gossamer-collect-{idx}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Runs `fetch` for every source and returns the outcome map, keyed by
    /// source identity. Blocks until every source has produced an outcome.
    pub fn collect<F>(&self, sources: &[Source], fetch: F) -> HashMap<String, FetchOutcome>
    where
        F: Fn(&Source) -> FetchOutcome + Sync,
    {
        let outcomes = Mutex::new(HashMap::with_capacity(sources.len()));

        self.pool.scope(|scope| {
            for source in sources {
                let outcomes = &outcomes;
                let fetch = &fetch;
                scope.spawn(move |_| {
                    debug!("collecting {}", source.raw());
                    let outcome = fetch(source);
                    let mut guard = outcomes.lock().expect("outcome map lock poisoned");
                    guard.insert(source.raw().to_owned(), outcome);
                });
            }
        });

        // All workers have joined; the map is complete and no longer shared.
        outcomes.into_inner().expect("outcome map lock poisoned")
    }
}
