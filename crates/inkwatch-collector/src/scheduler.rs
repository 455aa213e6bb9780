//! Bounded fetch scheduling.
//!
//! A fixed pool of cooperating workers pulls the next unclaimed target index
//! from a shared counter, so peak in-flight requests never exceed the
//! concurrency cap no matter how many addresses a scan expands to. Each worker
//! writes only the result slot of the index it claimed.

use crate::error::FetchError;
use crate::extract::ExtractionEngine;
use crate::fetcher::PageFetcher;
use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use inkwatch_core::{Device, Target};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(7);

/// Run `op` over every item with at most `concurrency` operations in flight.
///
/// `result[i]` always corresponds to `items[i]`, regardless of completion order.
pub async fn map_bounded<'a, T, R, F, Fut>(items: &'a [T], concurrency: usize, op: F) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let slots: Vec<OnceLock<R>> = items.iter().map(|_| OnceLock::new()).collect();
    let next = AtomicUsize::new(0);
    let workers = concurrency.max(1).min(items.len());

    {
        let (slots, next, op) = (&slots, &next, &op);
        join_all((0..workers).map(move |_| async move {
            loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(item) = items.get(index) else {
                    break;
                };
                let result = op(item).await;
                // Each index is claimed by exactly one worker.
                let _ = slots[index].set(result);
            }
        }))
        .await;
    }

    slots
        .into_iter()
        .map(|slot| slot.into_inner().expect("every index is claimed before workers exit"))
        .collect()
}

/// Fetches and extracts every target under a concurrency cap.
#[derive(Clone)]
pub struct FetchScheduler {
    fetcher: Arc<dyn PageFetcher>,
    engine: Arc<ExtractionEngine>,
    timeout: Duration,
}

impl FetchScheduler {
    /// Create a scheduler with the default extraction chain and timeout.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            engine: Arc::new(ExtractionEngine::default()),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the per-target timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the extraction engine.
    #[must_use]
    pub fn with_engine(mut self, engine: ExtractionEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Collect all targets. The result has one device per target, in target order.
    pub async fn collect_all(&self, targets: &[Target], concurrency: usize) -> Vec<Device> {
        tracing::info!(
            targets = targets.len(),
            concurrency,
            "starting bounded fetch"
        );
        map_bounded(targets, concurrency, |target| self.collect_isolated(target)).await
    }

    /// Collect one target, converting a panic during fetch or extraction into an error device.
    async fn collect_isolated(&self, target: &Target) -> Device {
        let started = Utc::now();
        match AssertUnwindSafe(self.collect_one(target)).catch_unwind().await {
            Ok(device) => device,
            Err(_) => {
                tracing::error!(address = %target.address, "collection of target panicked");
                Device::unreachable(target, "internal error while collecting device", None, started)
            }
        }
    }

    /// Single fetch attempt plus extraction.
    pub async fn collect_one(&self, target: &Target) -> Device {
        let started = Utc::now();
        match self.fetch(&target.address).await {
            Ok(page) => {
                let extraction = self.engine.extract(&page.body);
                tracing::debug!(
                    address = %target.address,
                    supplies = extraction.supplies.len(),
                    source = extraction.supply_source.unwrap_or("none"),
                    "extracted device"
                );
                extraction.into_device(target, page.status, started)
            }
            Err(err) => {
                tracing::debug!(address = %target.address, error = %err, "target unreachable");
                Device::unreachable(target, err.to_string(), err.status(), started)
            }
        }
    }

    /// One GET bounded by the scheduler timeout.
    pub async fn fetch(&self, url: &str) -> crate::fetcher::RawResponse {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch(url)).await {
            Ok(response) => response,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// The extraction engine in use.
    #[must_use]
    pub fn engine(&self) -> &ExtractionEngine {
        &self.engine
    }
}
