//! Fixed-position fields: identity header, trays, page counter, colour type.

use super::{element_text, PageDocument};
use inkwatch_core::{DeviceType, Supply, Tray};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("selector is hardcoded and valid")
}

pub(super) static BODY: Lazy<Selector> = Lazy::new(|| selector("body"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static DEVICE_NAME: Lazy<Selector> = Lazy::new(|| selector("#HomeDeviceName"));
static DEVICE_IP: Lazy<Selector> = Lazy::new(|| selector("#HomeDeviceIp"));
static MACHINE_STATUS: Lazy<Selector> = Lazy::new(|| selector("#MachineStatus"));
static STATUS_MESSAGE: Lazy<Selector> = Lazy::new(|| selector(".status-message"));

static TRAY_ROWS: Lazy<Selector> = Lazy::new(|| selector("#MediaTable tbody tr"));
static TABLE_CELL: Lazy<Selector> = Lazy::new(|| selector("td"));
static TRAY_NAME: Lazy<Selector> = Lazy::new(|| selector(r#"[id^="TrayBinName_"]"#));
static TRAY_STATUS: Lazy<Selector> = Lazy::new(|| selector(r#"[id^="TrayBinStatus_"]"#));
static TRAY_CAPACITY: Lazy<Selector> = Lazy::new(|| selector(r#"[id^="TrayBinCapacity_"]"#));
static TRAY_SIZE: Lazy<Selector> = Lazy::new(|| selector(r#"[id^="TrayBinSize_"]"#));
static TRAY_TYPE: Lazy<Selector> = Lazy::new(|| selector(r#"[id^="TrayBinType_"]"#));

static USAGE_PAGE: Lazy<Selector> = Lazy::new(|| selector("#UsagePage"));
static TOTAL_PAGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:total pages|total de páginas)[^0-9]*(\d{1,10})")
        .expect("total pages regex is hardcoded and valid")
});

static COLOR_INK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)magenta|amarelo|ciano|cyan|yellow").expect("color ink regex is hardcoded and valid")
});

pub(super) struct Header {
    pub title: Option<String>,
    pub device_name: Option<String>,
    pub device_ip: Option<String>,
    pub machine_status: Option<String>,
}

pub(super) fn header(page: &PageDocument) -> Header {
    Header {
        title: page.first_text(&TITLE),
        device_name: page.first_text(&DEVICE_NAME),
        device_ip: page.first_text(&DEVICE_IP),
        machine_status: page
            .first_text(&MACHINE_STATUS)
            .or_else(|| page.first_text(&STATUS_MESSAGE)),
    }
}

/// Tray rows of the `#MediaTable` layout. Each column prefers its
/// `TrayBin*_` element and falls back to the cell at the same position.
pub(super) fn trays(page: &PageDocument) -> Vec<Tray> {
    page.select(&TRAY_ROWS)
        .filter_map(|row| {
            let name = cell(row, &TRAY_NAME, 0)?;
            Some(Tray {
                name,
                status: cell(row, &TRAY_STATUS, 1).unwrap_or_default(),
                capacity: cell(row, &TRAY_CAPACITY, 2).unwrap_or_default(),
                size: cell(row, &TRAY_SIZE, 3).unwrap_or_default(),
                media_type: cell(row, &TRAY_TYPE, 4).unwrap_or_default(),
            })
        })
        .collect()
}

fn cell(row: ElementRef<'_>, by_id: &Selector, position: usize) -> Option<String> {
    row.select(by_id)
        .next()
        .and_then(element_text)
        .or_else(|| row.select(&TABLE_CELL).nth(position).and_then(element_text))
}

/// Total page counter, looked up in the usage section first and the whole body after.
pub(super) fn total_pages(page: &PageDocument) -> Option<String> {
    let usage = page
        .select(&USAGE_PAGE)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.is_empty());
    let haystack = usage.as_deref().unwrap_or_else(|| page.body_text());

    TOTAL_PAGES
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `Color` if any supply names a colour ink, `Mono` otherwise; `None` without supplies.
pub(super) fn device_type(supplies: &[Supply]) -> Option<DeviceType> {
    if supplies.is_empty() {
        return None;
    }
    if supplies.iter().any(|s| COLOR_INK.is_match(&s.name)) {
        Some(DeviceType::Color)
    } else {
        Some(DeviceType::Mono)
    }
}
