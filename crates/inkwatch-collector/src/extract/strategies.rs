//! Supply strategies, from most to least structured.

use super::{element_text, PageDocument, SupplyStrategy};
use inkwatch_core::Supply;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use std::collections::HashSet;

/// Number of `#SupplyName{i}` / `#SupplyPLR{i}` pairs probed.
const INDEXED_SLOTS: usize = 12;

/// Characters of preceding text inspected for a supply keyword.
const PROXIMITY_WINDOW: usize = 40;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("selector is hardcoded and valid")
}

static CONSUMABLE: Lazy<Selector> = Lazy::new(|| selector(".consumable"));
static CONSUMABLE_NAME: Lazy<Selector> = Lazy::new(|| selector("h2"));
static CONSUMABLE_PLR: Lazy<Selector> = Lazy::new(|| selector(".plr"));
static CONSUMABLE_GAUGE: Lazy<Selector> = Lazy::new(|| selector(".gauge span"));

static INDEXED: Lazy<Vec<(Selector, Selector)>> = Lazy::new(|| {
    (0..INDEXED_SLOTS)
        .map(|i| {
            (
                selector(&format!("#SupplyName{i}")),
                selector(&format!("#SupplyPLR{i}")),
            )
        })
        .collect()
});

const SUPPLY_KEYWORDS: &str = "Preto|Black|Ciano|Cyan|Magenta|Amarelo|Yellow|Toner|Tinta";

static LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)({SUPPLY_KEYWORDS})[\s:\-–]*(<|&lt;)?\s*(\d{{1,3}}%)"
    ))
    .expect("labeled percentage regex is hardcoded and valid")
});

static TONER_SYNONYM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:toner|tinta)$").expect("toner synonym regex is hardcoded and valid")
});

static KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?i){SUPPLY_KEYWORDS}")).expect("keyword regex is hardcoded and valid")
});

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}%").expect("percent regex is hardcoded and valid"));

/// `.consumable` blocks with an `h2` label and a `.plr` or gauge readout.
pub struct StructuredSelectors;

impl SupplyStrategy for StructuredSelectors {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, page: &PageDocument) -> Option<Vec<Supply>> {
        let supplies: Vec<Supply> = page
            .select(&CONSUMABLE)
            .filter_map(|block| {
                let name = block.select(&CONSUMABLE_NAME).next().and_then(element_text)?;
                let level = block
                    .select(&CONSUMABLE_PLR)
                    .next()
                    .and_then(element_text)
                    .or_else(|| block.select(&CONSUMABLE_GAUGE).next().and_then(element_text));
                Some(Supply::new(name, level))
            })
            .collect();
        (!supplies.is_empty()).then_some(supplies)
    }
}

/// Numbered `#SupplyName{i}` / `#SupplyPLR{i}` element pairs.
pub struct IndexedFallback;

impl SupplyStrategy for IndexedFallback {
    fn name(&self) -> &'static str {
        "indexed"
    }

    fn extract(&self, page: &PageDocument) -> Option<Vec<Supply>> {
        let supplies: Vec<Supply> = INDEXED
            .iter()
            .filter_map(|(name_sel, level_sel)| {
                let name = page.first_text(name_sel)?;
                Some(Supply::new(name, page.first_text(level_sel)))
            })
            .collect();
        (!supplies.is_empty()).then_some(supplies)
    }
}

/// `<keyword><separator><digits>%` in the visible text, English or Portuguese.
///
/// Toner/Tinta collapse to `Toner`; repeated (name, level) pairs are kept once.
/// A leading `<` on the level is preserved.
pub struct LabeledPercentage;

impl SupplyStrategy for LabeledPercentage {
    fn name(&self) -> &'static str {
        "labeled-percentage"
    }

    fn extract(&self, page: &PageDocument) -> Option<Vec<Supply>> {
        let mut seen = HashSet::new();
        let supplies: Vec<Supply> = LABELED
            .captures_iter(page.body_text())
            .filter_map(|caps| {
                let raw_name = caps.get(1)?.as_str();
                let name = if TONER_SYNONYM.is_match(raw_name) {
                    "Toner".to_string()
                } else {
                    raw_name.to_string()
                };
                let percent = caps.get(3)?.as_str();
                let level = match caps.get(2) {
                    Some(_) => format!("<{percent}"),
                    None => percent.to_string(),
                };
                seen.insert((name.clone(), level.clone()))
                    .then(|| Supply::new(name, Some(level)))
            })
            .collect();
        (!supplies.is_empty()).then_some(supplies)
    }
}

/// Last resort: any `NN%` with a supply keyword in the preceding text window.
pub struct ProximityHeuristic;

impl SupplyStrategy for ProximityHeuristic {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn extract(&self, page: &PageDocument) -> Option<Vec<Supply>> {
        let text = page.body_text();
        let supplies: Vec<Supply> = PERCENT
            .find_iter(text)
            .filter_map(|pct| {
                let start = window_start(text, pct.start(), PROXIMITY_WINDOW);
                let keyword = KEYWORD.find(&text[start..pct.end()])?;
                Some(Supply::new(keyword.as_str(), Some(pct.as_str().to_string())))
            })
            .collect();
        (!supplies.is_empty()).then_some(supplies)
    }
}

/// Byte offset `chars` characters before `end`, clamped to the start of `text`.
fn window_start(text: &str, end: usize, chars: usize) -> usize {
    text[..end]
        .char_indices()
        .rev()
        .nth(chars.saturating_sub(1))
        .map_or(0, |(i, _)| i)
}
