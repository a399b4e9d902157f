//! Catalog extraction: entries to validated price observations.
//!
//! One parser instance holds the compiled selector chains for a catalog
//! layout. Assembly walks every entry of a parsed document, resolves raw
//! fields through the fallback chains, normalizes prices, applies the
//! stock policy and collects the surviving observations into a batch
//! sharing a single capture timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::error::{ExtractionError, ExtractionResult};
use super::price::{decode_embedded_prices, normalize_price};
use super::selectors::{PriceStrategy, SelectorConfig};
use crate::domain::observation::{ObservationBatch, ProductObservation};
use crate::infrastructure::config::ScrapeConfig;

/// Parser for extracting price observations from catalog pages.
pub struct ObservationParser {
    /// Entry container selectors, primary first. Kept with their source
    /// strings so failures can report what was tried.
    entry_selectors: Vec<(String, Selector)>,
    title_selector: Selector,
    stock_selector: Selector,
    out_of_stock_markers: Vec<String>,
    embedded_price_attr: String,
    selling_chain: Vec<CompiledStrategy>,
    buying_chain: Vec<CompiledStrategy>,
    currency_markers: Vec<String>,
    base_url: String,
}

/// A compiled strategy of a raw-price fallback chain.
enum CompiledStrategy {
    CompositeParts { whole: Selector, fraction: Selector },
    Text { selector: Selector },
    AncestorText { selector: Selector, max_hops: usize },
}

impl ObservationParser {
    pub fn new(config: &ScrapeConfig) -> ExtractionResult<Self> {
        let selectors: &SelectorConfig = &config.selectors;

        let entry_selectors = selectors
            .entry
            .iter()
            .map(|raw| compile(raw).map(|selector| (raw.clone(), selector)))
            .collect::<ExtractionResult<Vec<_>>>()?;

        Ok(Self {
            entry_selectors,
            title_selector: compile(&selectors.title)?,
            stock_selector: compile(&selectors.stock_status)?,
            out_of_stock_markers: selectors.out_of_stock_markers.clone(),
            embedded_price_attr: selectors.embedded_price_attr.clone(),
            selling_chain: compile_chain(&selectors.selling_price)?,
            buying_chain: compile_chain(&selectors.buying_price)?,
            currency_markers: config.currency_markers.clone(),
            base_url: config.target_url.clone(),
        })
    }

    /// Assemble all product entries of a document into one batch.
    ///
    /// Entry selectors are tried in order; the first one matching anything
    /// wins. A document matching none of them is unparsable - recoverable
    /// for the run, which then simply persists nothing.
    pub fn assemble(&self, document: &Html) -> ExtractionResult<ObservationBatch> {
        let captured_at = Utc::now();

        let mut tried_selectors = Vec::new();
        let mut entries: Vec<ElementRef<'_>> = Vec::new();

        for (raw, selector) in &self.entry_selectors {
            tried_selectors.push(raw.clone());
            entries = document.select(selector).collect();
            if !entries.is_empty() {
                debug!("Found {} catalog entries using selector '{}'", entries.len(), raw);
                break;
            }
        }

        if entries.is_empty() {
            return Err(ExtractionError::NoEntriesFound { tried_selectors });
        }

        let mut batch = ObservationBatch::new(captured_at);
        for (index, entry) in entries.iter().enumerate() {
            match self.extract_observation(*entry, captured_at) {
                Ok(observation) => {
                    debug!(
                        "Scraped '{}': selling {}",
                        observation.product_name, observation.selling_price
                    );
                    batch.push(observation);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping entry {}: {}", index, e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Extracted {} observations from {} entries",
            batch.len(),
            entries.len()
        );
        Ok(batch)
    }

    /// Resolve one entry into an observation, or report why it is dropped.
    fn extract_observation(
        &self,
        entry: ElementRef<'_>,
        captured_at: DateTime<Utc>,
    ) -> ExtractionResult<ProductObservation> {
        let product_name = self
            .extract_title(entry)
            .ok_or_else(|| ExtractionError::required_field_missing("product_name", None))?;

        let source_url = self.extract_source_url(entry);
        let is_out_of_stock = self.is_out_of_stock(entry);

        let embedded = entry
            .value()
            .attr(&self.embedded_price_attr)
            .and_then(decode_embedded_prices);

        let selling_raw = resolve_raw(&self.selling_chain, entry);
        let selling_price = self
            .resolve_price(selling_raw.as_deref(), embedded.as_ref().and_then(|p| p.sell))
            .ok_or_else(|| {
                ExtractionError::required_field_missing("selling_price", Some(product_name.as_str()))
            })?;

        // Out-of-stock entries never carry a buying price; in-stock entries
        // must resolve one or the entry is dropped.
        let buying_price = if is_out_of_stock {
            None
        } else {
            let buying_raw = resolve_raw(&self.buying_chain, entry);
            match self.resolve_price(buying_raw.as_deref(), embedded.as_ref().and_then(|p| p.buy)) {
                Some(value) => Some(value),
                None => {
                    return Err(ExtractionError::required_field_missing(
                        "buying_price",
                        Some(product_name.as_str()),
                    ));
                }
            }
        };

        Ok(ProductObservation {
            timestamp: captured_at,
            product_name,
            selling_price,
            buying_price,
            source_url,
            is_out_of_stock,
        })
    }

    fn extract_title(&self, entry: ElementRef<'_>) -> Option<String> {
        entry
            .select(&self.title_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// The entry's own link attribute, when the entry itself is a link.
    fn extract_source_url(&self, entry: ElementRef<'_>) -> String {
        if entry.value().name() != "a" {
            return String::new();
        }
        match entry.value().attr("href") {
            Some(href) => resolve_url(href, &self.base_url),
            None => String::new(),
        }
    }

    /// Locale-exact stock check: the status element must exist and its
    /// trimmed text must equal one of the configured markers.
    fn is_out_of_stock(&self, entry: ElementRef<'_>) -> bool {
        let Some(status) = entry.select(&self.stock_selector).next() else {
            return false;
        };
        let text = status.text().collect::<String>();
        let text = text.trim();
        self.out_of_stock_markers.iter().any(|marker| marker == text)
    }

    /// Text normalization first; the embedded payload only covers a field
    /// whose text failed to parse or was never found.
    fn resolve_price(&self, raw: Option<&str>, embedded: Option<Decimal>) -> Option<Decimal> {
        match raw {
            Some(text) => match normalize_price(text, &self.currency_markers) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Price text '{}' did not normalize ({}); trying embedded payload", text, e);
                    embedded.filter(|value| !value.is_sign_negative())
                }
            },
            None => embedded.filter(|value| !value.is_sign_negative()),
        }
    }
}

fn compile(selector: &str) -> ExtractionResult<Selector> {
    Selector::parse(selector).map_err(|e| ExtractionError::invalid_selector(selector, e))
}

fn compile_chain(chain: &[PriceStrategy]) -> ExtractionResult<Vec<CompiledStrategy>> {
    chain
        .iter()
        .map(|strategy| {
            Ok(match strategy {
                PriceStrategy::CompositeParts { whole, fraction } => {
                    CompiledStrategy::CompositeParts {
                        whole: compile(whole)?,
                        fraction: compile(fraction)?,
                    }
                }
                PriceStrategy::Text { selector } => CompiledStrategy::Text {
                    selector: compile(selector)?,
                },
                PriceStrategy::AncestorText { selector, max_hops } => {
                    CompiledStrategy::AncestorText {
                        selector: compile(selector)?,
                        max_hops: *max_hops,
                    }
                }
            })
        })
        .collect()
}

/// Evaluate a fallback chain in order, short-circuiting at the first
/// strategy that yields non-empty raw text. Exhaustion means the field is
/// absent, not empty.
fn resolve_raw(chain: &[CompiledStrategy], entry: ElementRef<'_>) -> Option<String> {
    for strategy in chain {
        let raw = match strategy {
            CompiledStrategy::CompositeParts { whole, fraction } => {
                composite_text(entry, whole, fraction)
            }
            CompiledStrategy::Text { selector } => first_text(entry, selector),
            CompiledStrategy::AncestorText { selector, max_hops } => {
                ancestor_text(entry, selector, *max_hops)
            }
        };
        if raw.is_some() {
            return raw;
        }
    }
    None
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whole and fractional sub-elements joined with a decimal point.
/// Both parts must be present; otherwise the next strategy gets a turn.
fn composite_text(
    entry: ElementRef<'_>,
    whole: &Selector,
    fraction: &Selector,
) -> Option<String> {
    let whole_text = first_text(entry, whole)?;
    let fraction_text = first_text(entry, fraction)?;
    Some(format!("{}.{}", whole_text, fraction_text))
}

/// Probe ancestor subtrees for the selector, up to `max_hops` levels.
/// The original catalog keeps some price badges outside the entry node.
fn ancestor_text(entry: ElementRef<'_>, selector: &Selector, max_hops: usize) -> Option<String> {
    let mut current = entry;
    for _ in 0..max_hops {
        let parent = current.parent().and_then(ElementRef::wrap)?;
        if let Some(text) = first_text(parent, selector) {
            return Some(text);
        }
        current = parent;
    }
    None
}

fn resolve_url(href: &str, base_url: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            debug!("Could not resolve '{}' against '{}': {}", href, base_url, e);
            href.to_string()
        }
    }
}
