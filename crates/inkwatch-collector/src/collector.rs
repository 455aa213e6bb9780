//! Collection run orchestration.
//!
//! A run is Resolve → Fetch/Extract → Assemble → Persist → Alert. Failures are
//! captured at the smallest scope and turned into data, so a run always yields
//! a [`Snapshot`], even when every target is unreachable.

use crate::alerts::{resolve_threshold, AlertEngine};
use crate::error::{CollectError, FetchError, Result};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::resolver::resolve_targets;
use crate::scheduler::FetchScheduler;
use crate::sink::CollectionSink;
use crate::snapshot::{CollectionRun, SnapshotAssembler};
use crate::subscribers::SubscriberRegistry;
use chrono::Utc;
use inkwatch_core::{AppConfig, Device, PrintersConfig, Snapshot, Target};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Per-run options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Collect only the first `limit` resolved targets; 0 collects all
    pub limit: Option<usize>,
}

impl RunOptions {
    /// Options for a partial run over at most `limit` targets.
    #[must_use]
    pub fn limited(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

/// Runs collections against a sink and an alert registry.
pub struct Collector {
    scheduler: FetchScheduler,
    sink: Arc<dyn CollectionSink>,
    alerts: AlertEngine,
    /// Threshold from the environment level configuration
    env_threshold: Option<u32>,
    /// Held for the duration of a run; overlapping runs queue up
    run_guard: Mutex<()>,
}

impl Collector {
    /// Create a collector from its parts.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn CollectionSink>,
        registry: SubscriberRegistry,
    ) -> Self {
        Self {
            scheduler: FetchScheduler::new(fetcher),
            sink,
            alerts: AlertEngine::new(registry),
            env_threshold: None,
            run_guard: Mutex::new(()),
        }
    }

    /// Build a collector with an HTTP fetcher configured from `config`.
    pub fn from_config(
        config: &AppConfig,
        sink: Arc<dyn CollectionSink>,
        registry: SubscriberRegistry,
    ) -> Result<Self> {
        let fetcher =
            HttpFetcher::new(&config.collector).map_err(|e| CollectError::HttpClient(e.to_string()))?;
        let timeout = fetcher.timeout();

        Ok(Self::new(Arc::new(fetcher), sink, registry)
            .with_timeout(timeout)
            .with_env_threshold(config.alerts.threshold))
    }

    /// Set the per-target timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.scheduler = self.scheduler.with_timeout(timeout);
        self
    }

    /// Set the threshold used when the printers configuration has none.
    #[must_use]
    pub fn with_env_threshold(mut self, threshold: Option<u32>) -> Self {
        self.env_threshold = threshold;
        self
    }

    /// The alert engine, for subscribing to live alerts.
    #[must_use]
    pub fn alerts(&self) -> &AlertEngine {
        &self.alerts
    }

    /// Run a collection and return its snapshot.
    pub async fn run_collection(&self, config: &PrintersConfig, options: RunOptions) -> Snapshot {
        self.collect(config, options).await.snapshot
    }

    /// Run a collection and return the snapshot, raw results and alerts.
    pub async fn collect(&self, config: &PrintersConfig, options: RunOptions) -> CollectionRun {
        let _guard = match self.run_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!("collection already running, waiting for it to finish");
                self.run_guard.lock().await
            }
        };

        let targets = resolve_targets(config, options.limit);
        let results = self.scheduler.collect_all(&targets, config.concurrency()).await;
        let mut run = SnapshotAssembler::assemble_run(results);

        if let Err(err) = self.sink.append_snapshot(&run.snapshot).await {
            tracing::warn!(error = %err, "failed to persist snapshot");
        }
        if let Err(err) = self.sink.append_run(run.snapshot.timestamp, &run.results).await {
            tracing::warn!(error = %err, "failed to persist run results");
        }

        let threshold = resolve_threshold(config.threshold(), self.env_threshold);
        run.alerts = AlertEngine::evaluate(&run.snapshot, threshold);
        self.alerts.emit(&run.alerts, self.sink.as_ref()).await;

        tracing::info!(
            targets = targets.len(),
            ok = run.ok_count(),
            errors = run.error_count(),
            alerts = run.alerts.len(),
            threshold,
            "collection run finished"
        );

        run
    }

    /// Fetch a single host without persisting anything.
    ///
    /// A host without an `http://` or `https://` prefix is tried over https
    /// first, then http.
    pub async fn probe(&self, host: &str) -> std::result::Result<Device, FetchError> {
        let host = host.trim();
        let lower = host.to_ascii_lowercase();
        let has_scheme = lower.starts_with("http://") || lower.starts_with("https://");
        let candidates: Vec<String> = if has_scheme {
            vec![host.to_string()]
        } else {
            vec![format!("https://{host}"), format!("http://{host}")]
        };

        let mut last_error = FetchError::InvalidAddress {
            address: host.to_string(),
            reason: "empty host".to_string(),
        };
        for candidate in candidates {
            if let Err(err) = Url::parse(&candidate) {
                last_error = FetchError::InvalidAddress {
                    address: candidate,
                    reason: err.to_string(),
                };
                continue;
            }

            let started = Utc::now();
            match self.scheduler.fetch(&candidate).await {
                Ok(page) => {
                    let target = Target::new(host, candidate);
                    let extraction = self.scheduler.engine().extract(&page.body);
                    return Ok(extraction.into_device(&target, page.status, started));
                }
                Err(err) => {
                    tracing::debug!(url = %candidate, error = %err, "probe attempt failed");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}
