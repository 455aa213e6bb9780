//! Inkwatch Collector - printer status collection engine.
//!
//! Turns a printers configuration into a point-in-time [`Snapshot`] of every
//! reachable printer, and raises low-supply alerts from it.
//!
//! # Pipeline
//!
//! 1. [`resolver`] expands static entries and subnet scans into a deduplicated
//!    target list.
//! 2. [`scheduler`] fetches every target through a bounded worker pool.
//! 3. [`extract`] turns each status page into supplies, trays and counters.
//! 4. [`snapshot`] keeps the reachable devices as the canonical view.
//! 5. [`alerts`] compares supply levels to the threshold and fans events out
//!    to the [`sink`] and the live [`subscribers`].
//!
//! # Example
//!
//! ```ignore
//! use inkwatch_collector::{Collector, RunOptions, SubscriberRegistry};
//!
//! let registry = SubscriberRegistry::default();
//! let collector = Collector::from_config(&app_config, Arc::new(db), registry.clone())?;
//! let snapshot = collector.run_collection(&printers, RunOptions::default()).await;
//! println!("{} devices online", snapshot.devices.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerts;
pub mod collector;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod extract;
pub mod fetcher;
pub mod resolver;
pub mod scheduler;
pub mod sink;
pub mod snapshot;
pub mod subscribers;

// Re-export commonly used types
pub use alerts::{resolve_threshold, AlertEngine};
pub use collector::{Collector, RunOptions};
pub use error::{CollectError, FetchError, Result};
pub use extract::{Extraction, ExtractionEngine, PageDocument, SupplyStrategy};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher, RawResponse};
pub use resolver::resolve_targets;
pub use scheduler::{map_bounded, FetchScheduler, DEFAULT_FETCH_TIMEOUT};
pub use sink::CollectionSink;
pub use snapshot::{CollectionRun, SnapshotAssembler};
pub use subscribers::{PublishReport, SubscriberRegistry, Subscription};

pub use inkwatch_core::{AlertEvent, Device, PrintersConfig, Snapshot, Target};
