//! HTML status page to structured device telemetry.
//!
//! Printer web interfaces have no common schema, so supplies are found by an
//! ordered chain of [`SupplyStrategy`] implementations. The first strategy that
//! yields at least one supply wins; the more structured ones run first so the
//! noisy text heuristics only see pages nothing else understood. When every
//! strategy misses, the result is still a valid, empty [`Extraction`].

mod fields;
mod strategies;

pub use strategies::{IndexedFallback, LabeledPercentage, ProximityHeuristic, StructuredSelectors};

use chrono::{DateTime, Utc};
use inkwatch_core::{identity_of, Device, DeviceStatus, DeviceType, Supply, Target, Tray};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// A parsed status page with its visible text precomputed.
pub struct PageDocument {
    html: Html,
    body_text: String,
}

impl PageDocument {
    /// Parse an HTML document.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let html = Html::parse_document(html);
        let body_text = html
            .select(&fields::BODY)
            .next()
            .map_or_else(|| html.root_element().text().collect(), |body| body.text().collect());
        Self { html, body_text }
    }

    /// Concatenated text of the `<body>`.
    #[must_use]
    pub fn body_text(&self) -> &str {
        &self.body_text
    }

    /// All elements matching `selector`, in document order.
    pub fn select<'a, 'b>(
        &'a self,
        selector: &'b Selector,
    ) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }

    /// Trimmed text of the first element matching `selector`, if non-empty.
    #[must_use]
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.html.select(selector).next().and_then(element_text)
    }
}

/// Trimmed text content of an element, `None` when blank.
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// One way of finding supplies on a page.
///
/// Implementations are pure: the same document always yields the same result.
pub trait SupplyStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Supplies found on the page, `None` when the strategy does not apply.
    fn extract(&self, page: &PageDocument) -> Option<Vec<Supply>>;
}

/// Everything extracted from one status page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub title: Option<String>,
    pub device_name: Option<String>,
    pub device_ip: Option<String>,
    pub machine_status: Option<String>,
    pub supplies: Vec<Supply>,
    /// Strategy that produced `supplies`
    pub supply_source: Option<&'static str>,
    pub trays: Vec<Tray>,
    pub pages: Option<String>,
    pub device_type: Option<DeviceType>,
}

impl Extraction {
    /// Combine with the fetch target into an `ok` device.
    #[must_use]
    pub fn into_device(self, target: &Target, status_code: u16, timestamp: DateTime<Utc>) -> Device {
        let mut device = Device::bare(target, DeviceStatus::Ok, timestamp);
        device.status_code = Some(status_code);
        if let Some(name) = &self.device_name {
            device.display_name.clone_from(name);
        }
        device.device_name = self.device_name;
        device.device_ip = self.device_ip;
        device.title = self.title;
        device.machine_status = self.machine_status;
        device.supplies = self.supplies;
        device.trays = self.trays;
        device.pages = self.pages;
        device.device_type = self.device_type;
        device.identity = identity_of(&device);
        device
    }
}

/// Runs the supply strategy chain and the fixed field extractors.
pub struct ExtractionEngine {
    strategies: Vec<Box<dyn SupplyStrategy>>,
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(StructuredSelectors),
            Box::new(IndexedFallback),
            Box::new(LabeledPercentage),
            Box::new(ProximityHeuristic),
        ])
    }
}

impl ExtractionEngine {
    /// Engine with a custom, ordered strategy chain.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn SupplyStrategy>>) -> Self {
        Self { strategies }
    }

    /// Names of the configured strategies, in order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract device telemetry from raw HTML.
    #[must_use]
    pub fn extract(&self, html: &str) -> Extraction {
        let page = PageDocument::parse(html);
        self.extract_document(&page)
    }

    /// Extract device telemetry from an already parsed page.
    #[must_use]
    pub fn extract_document(&self, page: &PageDocument) -> Extraction {
        let header = fields::header(page);

        let found = self.strategies.iter().find_map(|strategy| {
            strategy
                .extract(page)
                .filter(|supplies| !supplies.is_empty())
                .map(|supplies| (strategy.name(), supplies))
        });
        let (supply_source, supplies) = match found {
            Some((name, supplies)) => (Some(name), supplies),
            None => (None, Vec::new()),
        };

        let device_type = fields::device_type(&supplies);

        Extraction {
            title: header.title,
            device_name: header.device_name,
            device_ip: header.device_ip,
            machine_status: header.machine_status,
            supplies,
            supply_source,
            trays: fields::trays(page),
            pages: fields::total_pages(page),
            device_type,
        }
    }
}
