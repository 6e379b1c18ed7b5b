//! All-or-nothing batch fetching.

use std::time::Instant;

use dashboard_core::{Resource, ResourceSet, Session};
use futures::stream::{FuturesUnordered, StreamExt};
use telemetry::metrics;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::source::ResourceSource;

/// Fetches every resource concurrently and returns them together.
///
/// Either every resource arrives or the batch fails; a partial set is never
/// returned. An authorization failure ends the batch at once and the
/// outstanding requests are dropped. Any other failure is remembered while
/// the remaining requests drain, and the first one seen is returned.
pub async fn fetch_batch(
    source: &dyn ResourceSource,
    resources: &[Resource],
    session: Option<&Session>,
) -> FetchResult<ResourceSet> {
    let started = Instant::now();
    let mut wanted: Vec<Resource> = Vec::with_capacity(resources.len());
    for resource in resources {
        if !wanted.contains(resource) {
            wanted.push(*resource);
        }
    }

    let mut pending: FuturesUnordered<_> = wanted
        .iter()
        .map(|&resource| async move { (resource, source.fetch(resource, session).await) })
        .collect();

    let mut set = ResourceSet::new();
    let mut first_error: Option<FetchError> = None;

    while let Some((resource, result)) = pending.next().await {
        match result {
            Ok(records) => {
                if first_error.is_none() {
                    set.insert(resource, records);
                }
            }
            Err(e) if e.is_auth() => {
                drop(pending);
                return Err(fail(e, started));
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(fail(e, started));
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    metrics().batches_completed.inc();
    metrics().batch_latency_ms.observe(elapsed_ms);
    debug!(resources = set.len(), elapsed_ms, "Batch fetched");
    Ok(set)
}

fn fail(error: FetchError, started: Instant) -> FetchError {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    metrics().batches_failed.inc();
    metrics().batch_latency_ms.observe(elapsed_ms);
    warn!(code = error.code(), error = %error, elapsed_ms, "Batch failed");
    error
}
