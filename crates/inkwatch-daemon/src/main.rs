//! Inkwatch daemon: collects printer status on a schedule and logs low-supply alerts.

use anyhow::Context;
use chrono::Utc;
use inkwatch_collector::{Collector, RunOptions, SubscriberRegistry, Subscription};
use inkwatch_core::{AppConfig, PrintersConfig};
use inkwatch_db::Database;
use inkwatch_scheduler::CollectionSchedule;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,inkwatch=debug,inkwatch_collector=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Read the printers document fresh for every run; a broken file means an empty run.
fn load_printers(path: &Path) -> PrintersConfig {
    match PrintersConfig::load(path) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to load printers config");
            PrintersConfig::default()
        }
    }
}

/// Forward published alerts to the log until the registry goes away.
async fn log_alerts(mut subscription: Subscription) {
    while let Some(event) = subscription.receiver.recv().await {
        warn!(
            device = %event.device_name,
            identity = %event.device_identity,
            supply = %event.supply,
            level = %event.level,
            "{}",
            event.kind
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting inkwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    let printers_path = config.printers_file().context("no printers file location")?;
    let database_path = config.database_path().context("no database location")?;

    let db = Database::new(&database_path)
        .await
        .with_context(|| format!("failed to open database at {}", database_path.display()))?;
    db.run_migrations().await.context("failed to migrate database")?;

    let registry = SubscriberRegistry::new(config.alerts.subscriber_buffer);
    tokio::spawn(log_alerts(registry.subscribe()));

    let collector = Collector::from_config(&config, Arc::new(db.clone()), registry)
        .context("failed to build collector")?;

    let mut schedule = CollectionSchedule::new(
        config.schedule.interval_minutes,
        config.schedule.run_on_startup,
        Utc::now(),
    );
    info!(
        printers = %printers_path.display(),
        database = %database_path.display(),
        interval_minutes = schedule.interval_minutes,
        "collector ready"
    );

    loop {
        tokio::select! {
            () = tokio::time::sleep(schedule.wait(Utc::now())) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
        if !schedule.is_due(Utc::now()) {
            continue;
        }

        let started = Utc::now();
        let printers = load_printers(&printers_path);
        let snapshot = collector.run_collection(&printers, RunOptions::default()).await;
        info!(devices = snapshot.devices.len(), "snapshot updated");
        schedule.mark_run(started);
    }

    db.close().await;
    Ok(())
}
