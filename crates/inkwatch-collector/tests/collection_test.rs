use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inkwatch_collector::{
    CollectionSink, Collector, FetchError, FetchedPage, PageFetcher, RawResponse, RunOptions,
    SubscriberRegistry,
};
use inkwatch_core::{AlertEvent, Device, DeviceStatus, PrintersConfig, Snapshot};
use inkwatch_db::{alerts, runs, snapshots, AlertFilter, Database};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LOW_TONER_PAGE: &str = r#"
    <html><head><title>Printer Home</title></head><body>
      <span id="HomeDeviceName">Finance-MFP</span>
      <span id="HomeDeviceIp">10.0.0.1</span>
      <div class="consumable"><h2>Black</h2><span class="plr">5%</span></div>
      <div class="consumable"><h2>Cyan</h2><span class="plr">3%</span></div>
    </body></html>
"#;

const HEALTHY_PAGE: &str = "<html><body><p>Toner: 80%</p></body></html>";

/// Serves pages by address and records every requested URL.
#[derive(Default)]
struct FakeFetcher {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> RawResponse {
        self.requested.lock().expect("lock").push(url.to_string());

        let body = match url {
            "https://10.0.0.1" => LOW_TONER_PAGE,
            "https://10.0.0.2" | "http://printer.local" => HEALTHY_PAGE,
            _ => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "connect ECONNREFUSED".to_string(),
                })
            }
        };
        Ok(FetchedPage {
            url: url.to_string(),
            status: 200,
            body: body.to_string(),
        })
    }
}

async fn setup() -> (Collector, Database, SubscriberRegistry, Arc<FakeFetcher>) {
    let db = Database::new(":memory:").await.expect("create database");
    db.run_migrations().await.expect("run migrations");
    let registry = SubscriberRegistry::default();
    let fetcher = Arc::new(FakeFetcher::default());
    let collector = Collector::new(fetcher.clone(), Arc::new(db.clone()), registry.clone());
    (collector, db, registry, fetcher)
}

fn printers() -> PrintersConfig {
    PrintersConfig::from_json(
        r#"{
            "printers": [{"name": "Finance", "ip": "https://10.0.0.1"}],
            "scan": {"enabled": true, "prefixes": [{"prefix": "10.0.0.", "label": "HQ"}],
                     "start": 1, "end": 5, "concurrency": 2}
        }"#,
    )
    .expect("valid printers config")
}

#[tokio::test]
async fn test_full_run_persists_and_alerts() {
    let (collector, db, registry, _) = setup().await;
    let mut subscription = registry.subscribe();

    let run = collector.collect(&printers(), RunOptions::default()).await;

    // 10.0.0.1 is listed statically and scanned; it is fetched once.
    assert_eq!(run.results.len(), 5);
    assert_eq!(run.snapshot.devices.len(), 2);
    assert_eq!(run.error_count(), 3);
    assert!(run.results[2..].iter().all(|d| d.status == DeviceStatus::Error));
    assert_eq!(run.results[1].location_label.as_deref(), Some("HQ"));

    assert_eq!(run.alerts.len(), 1);
    assert_eq!(run.alerts[0].supply, "Black");
    assert_eq!(run.alerts[0].device_name, "Finance-MFP");

    let latest = snapshots::latest_snapshot(db.pool())
        .await
        .expect("query")
        .expect("snapshot stored");
    assert_eq!(latest, run.snapshot);

    let stored_alerts = alerts::alert_history(db.pool(), &AlertFilter::default(), 10)
        .await
        .expect("alert history");
    assert_eq!(stored_alerts, run.alerts);

    let summaries = runs::list_runs(db.pool(), 10).await.expect("runs");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].device_count, 5);
    assert_eq!(summaries[0].ok_count, 2);

    let published = subscription.receiver.recv().await.expect("alert published");
    assert_eq!(published.device_identity, "10.0.0.1");
}

#[tokio::test]
async fn test_limit_truncates_targets() {
    let (collector, _db, _registry, fetcher) = setup().await;

    let snapshot = collector
        .run_collection(&printers(), RunOptions::limited(2))
        .await;

    assert_eq!(snapshot.devices.len(), 2);
    assert_eq!(
        *fetcher.requested.lock().expect("lock"),
        vec!["https://10.0.0.1".to_string(), "https://10.0.0.2".to_string()]
    );
}

#[tokio::test]
async fn test_config_threshold_overrides_environment() {
    let (collector, _db, _registry, _) = setup().await;
    let collector = collector.with_env_threshold(Some(90));

    let strict = PrintersConfig::from_json(
        r#"{"printers": [{"name": "Finance", "ip": "https://10.0.0.1"}], "threshold": 2}"#,
    )
    .expect("valid printers config");
    let run = collector.collect(&strict, RunOptions::default()).await;
    assert!(run.alerts.is_empty());

    let lenient = PrintersConfig::from_json(r#"[{"name": "Lab", "ip": "https://10.0.0.2"}]"#)
        .expect("valid printers config");
    let run = collector.collect(&lenient, RunOptions::default()).await;
    assert_eq!(run.alerts.len(), 1);
    assert_eq!(run.alerts[0].level, "80");
}

#[tokio::test]
async fn test_every_target_failing_still_yields_snapshot() {
    let (collector, db, _registry, _) = setup().await;
    let config = PrintersConfig::from_json(r#"[{"name": "Gone", "ip": "https://10.9.9.9"}]"#)
        .expect("valid printers config");

    let snapshot = collector.run_collection(&config, RunOptions::default()).await;

    assert!(snapshot.devices.is_empty());
    let csv = runs::export_run_counts_csv(db.pool(), 10).await.expect("csv");
    assert!(csv.lines().nth(1).is_some_and(|row| row.ends_with(",1,0,1")));
}

type EventLog = Arc<Mutex<Vec<&'static str>>>;

/// Logs when a fetch starts and finishes, yielding in between.
struct SlowFetcher {
    events: EventLog,
}

#[async_trait]
impl PageFetcher for SlowFetcher {
    async fn fetch(&self, url: &str) -> RawResponse {
        self.events.lock().expect("lock").push("fetch started");
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.events.lock().expect("lock").push("fetch finished");
        Ok(FetchedPage {
            url: url.to_string(),
            status: 200,
            body: HEALTHY_PAGE.to_string(),
        })
    }
}

/// Logs every persisted run and discards everything else.
struct RunLogSink {
    events: EventLog,
}

#[async_trait]
impl CollectionSink for RunLogSink {
    async fn append_snapshot(&self, _snapshot: &Snapshot) -> inkwatch_core::Result<()> {
        Ok(())
    }

    async fn append_run(
        &self,
        _timestamp: DateTime<Utc>,
        _results: &[Device],
    ) -> inkwatch_core::Result<()> {
        self.events.lock().expect("lock").push("run persisted");
        Ok(())
    }

    async fn append_alert(&self, _event: &AlertEvent) -> inkwatch_core::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_overlapping_runs_do_not_interleave() {
    let events = EventLog::default();
    let collector = Collector::new(
        Arc::new(SlowFetcher {
            events: events.clone(),
        }),
        Arc::new(RunLogSink {
            events: events.clone(),
        }),
        SubscriberRegistry::default(),
    );
    let config = PrintersConfig::from_json(r#"[{"name": "Lab", "ip": "https://10.0.0.2"}]"#)
        .expect("valid printers config");

    let (first, second) = tokio::join!(
        collector.collect(&config, RunOptions::default()),
        collector.collect(&config, RunOptions::default()),
    );

    assert_eq!(first.results.len(), 1);
    assert_eq!(second.results.len(), 1);
    // The second run only starts fetching once the first has been persisted.
    assert_eq!(
        *events.lock().expect("lock"),
        vec![
            "fetch started",
            "fetch finished",
            "run persisted",
            "fetch started",
            "fetch finished",
            "run persisted",
        ]
    );
}

#[tokio::test]
async fn test_probe_falls_back_to_http() {
    let (collector, db, _registry, fetcher) = setup().await;

    let device = collector.probe("printer.local").await.expect("probe succeeds");

    assert!(device.is_ok());
    assert_eq!(device.url, "http://printer.local");
    assert_eq!(
        *fetcher.requested.lock().expect("lock"),
        vec!["https://printer.local".to_string(), "http://printer.local".to_string()]
    );
    assert!(snapshots::latest_snapshot(db.pool())
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn test_probe_reports_last_error() {
    let (collector, _db, _registry, _) = setup().await;

    let err = collector.probe("10.9.9.9").await.expect_err("unreachable");

    assert!(err.to_string().contains("http://10.9.9.9"), "got {err}");
}

#[tokio::test]
async fn test_explicit_http_scheme_is_fetched_as_given() {
    let (collector, _db, _registry, fetcher) = setup().await;

    let device = collector
        .probe("http://printer.local")
        .await
        .expect("probe succeeds");

    assert_eq!(device.url, "http://printer.local");
    assert_eq!(
        *fetcher.requested.lock().expect("lock"),
        vec!["http://printer.local".to_string()]
    );

    fetcher.requested.lock().expect("lock").clear();
    let _ = collector.probe("HTTPS://10.9.9.9").await;
    assert_eq!(
        *fetcher.requested.lock().expect("lock"),
        vec!["HTTPS://10.9.9.9".to_string()]
    );
}

#[tokio::test]
async fn test_other_schemes_are_treated_as_bare_hosts() {
    let (collector, _db, _registry, fetcher) = setup().await;

    let _ = collector.probe("ftp://printer.local").await;

    let requested = fetcher.requested.lock().expect("lock").clone();
    assert!(!requested.contains(&"ftp://printer.local".to_string()));
    assert!(requested
        .first()
        .is_some_and(|url| url.starts_with("https://")));
}
