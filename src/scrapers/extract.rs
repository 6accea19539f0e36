//! Listing card extraction from a rendered results page.

use crate::config::{ConfigError, ListingSelectors};
use crate::models::ListingRecord;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::trace;

/// The first required field a candidate was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionGap {
    pub field: &'static str,
}

/// Everything one page yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageExtraction {
    #[serde(skip)]
    pub records: Vec<ListingRecord>,
    pub candidates: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ListingExtractor {
    candidate: Selector,
    summary: Selector,
    delimiter: String,
    mileage: Selector,
    gearbox: Selector,
    year: Selector,
    fuel_type: Selector,
    price: Selector,
    currency: Selector,
    local_currency: String,
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Trimmed text of the first match, with whitespace runs collapsed.
fn text_of(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = node.select(selector).next()?;
    let text = element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

impl ListingExtractor {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, ConfigError> {
        let parameter = |key: &str| {
            parse_selector(&format!("[{}=\"{}\"]", selectors.parameter_attribute, key))
        };

        Ok(Self {
            candidate: parse_selector(&selectors.candidate)?,
            summary: parse_selector(&selectors.summary)?,
            delimiter: selectors.summary_delimiter.clone(),
            mileage: parameter(&selectors.mileage_key)?,
            gearbox: parameter(&selectors.gearbox_key)?,
            year: parameter(&selectors.year_key)?,
            fuel_type: parameter(&selectors.fuel_type_key)?,
            price: parse_selector(&selectors.price)?,
            currency: parse_selector(&selectors.currency)?,
            local_currency: selectors.local_currency.clone(),
        })
    }

    /// Complete records of `document`, in DOM order. Incomplete candidates
    /// are passed over.
    pub fn records<'a>(
        &'a self,
        document: &'a Html,
    ) -> impl Iterator<Item = ListingRecord> + 'a {
        document
            .select(&self.candidate)
            .filter_map(move |node| self.extract_candidate(node).ok())
    }

    /// Parses `html` and extracts every complete record, counting the rest.
    pub fn extract_page(&self, html: &str) -> PageExtraction {
        let document = Html::parse_document(html);
        let mut page = PageExtraction::default();

        for (idx, node) in document.select(&self.candidate).enumerate() {
            page.candidates += 1;
            match self.extract_candidate(node) {
                Ok(record) => page.records.push(record),
                Err(gap) => {
                    page.skipped += 1;
                    trace!("Skipped candidate {}: missing {}", idx, gap.field);
                }
            }
        }

        page
    }

    /// Builds a record from one candidate node, or reports the first
    /// missing field.
    pub fn extract_candidate(&self, node: ElementRef<'_>) -> Result<ListingRecord, ExtractionGap> {
        let gap = |field| ExtractionGap { field };

        let summary = text_of(node, &self.summary).ok_or(gap("summary"))?;
        // Positional: a blank segment is a missing field, not a shift.
        let mut segments = summary.split(self.delimiter.as_str()).map(str::trim);
        let mut positional = |field| match segments.next() {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(gap(field)),
        };
        let engine_size = positional("engine_size")?;
        let horsepower = positional("horsepower")?;

        let mileage = text_of(node, &self.mileage).ok_or(gap("mileage"))?;
        let gearbox = text_of(node, &self.gearbox).ok_or(gap("gearbox"))?;
        let production_year = text_of(node, &self.year).ok_or(gap("production_year"))?;
        let fuel_type = text_of(node, &self.fuel_type).ok_or(gap("fuel_type"))?;

        let currency = text_of(node, &self.currency).ok_or(gap("price"))?;
        if currency != self.local_currency {
            return Err(gap("price"));
        }
        let price = text_of(node, &self.price).ok_or(gap("price"))?;

        Ok(ListingRecord {
            engine_size,
            horsepower,
            mileage,
            gearbox,
            production_year,
            fuel_type,
            price,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Listing card markup in the shape of the live results page.
    pub fn card(
        id: u32,
        summary: Option<&str>,
        params: &[(&str, &str)],
        price: Option<(&str, &str)>,
    ) -> String {
        let summary = summary
            .map(|s| format!(r#"<p data-testid="ad-summary">{s}</p>"#))
            .unwrap_or_default();
        let params: String = params
            .iter()
            .map(|(k, v)| format!(r#"<dd data-parameter="{k}">{v}</dd>"#))
            .collect();
        let price = price
            .map(|(amount, currency)| {
                format!(r#"<div data-testid="ad-price"><h3>{amount}</h3><p>{currency}</p></div>"#)
            })
            .unwrap_or_default();
        format!(
            r#"<article data-id="{id}"><section>{summary}<dl>{params}</dl></section>{price}</article>"#
        )
    }

    pub fn complete_card(id: u32, price: &str) -> String {
        card(
            id,
            Some("1 598 cm3 • 116 KM • Hatchback"),
            &[
                ("mileage", "120 000 km"),
                ("gearbox", "Manualna"),
                ("year", "2016"),
                ("fuel_type", "Diesel"),
            ],
            Some((price, "PLN")),
        )
    }

    pub fn results_page(cards: &[String]) -> String {
        format!(
            r#"<html><body><main><div data-testid="search-results">{}</div></main></body></html>"#,
            cards.concat()
        )
    }
}
