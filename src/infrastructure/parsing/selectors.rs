//! Selector configuration for catalog extraction.
//!
//! The unstable parts of the markup are expressed as ordered fallback
//! chains: lists of strategies tried in sequence until one yields usable
//! raw text. The stable parts (title, stock badge) stay single selectors.

use serde::{Deserialize, Serialize};

/// CSS selectors and marker strings for one catalog layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Entry container selectors: primary first, then one (or more)
    /// alternatives tried only when the primary finds nothing.
    pub entry: Vec<String>,

    /// The single, well-known title sub-element. Entries without it are
    /// skipped entirely.
    pub title: String,

    /// Stock-status sub-element; its text is compared against
    /// `out_of_stock_markers` with exact equality.
    pub stock_status: String,

    /// Marker strings meaning "sold out", locale-exact.
    pub out_of_stock_markers: Vec<String>,

    /// Entry attribute carrying a machine-readable price payload, used
    /// as a structured fallback when text normalization fails.
    pub embedded_price_attr: String,

    /// Fallback chain for the selling price.
    pub selling_price: Vec<PriceStrategy>,

    /// Fallback chain for the buying price.
    pub buying_price: Vec<PriceStrategy>,
}

/// One strategy in a raw-price fallback chain.
///
/// Strategies are pure entry -> optional raw text lookups; a chain
/// short-circuits at the first strategy producing non-empty text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceStrategy {
    /// A composite node split into whole and fractional sub-elements,
    /// concatenated with a decimal point ("45" + "99" -> "45.99").
    CompositeParts { whole: String, fraction: String },

    /// Plain text of the first element matching a selector.
    Text { selector: String },

    /// Like `Text`, but probing ancestor elements when the entry itself
    /// has no match, up to `max_hops` levels.
    AncestorText { selector: String, max_hops: usize },
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            entry: vec!["a.product".to_string(), "div.product__meta".to_string()],
            title: "span.product__title-inner".to_string(),
            stock_status: ".product__availability".to_string(),
            out_of_stock_markers: vec!["Изчерпан".to_string(), "Sold out".to_string()],
            embedded_price_attr: "data-prices".to_string(),
            selling_price: vec![
                PriceStrategy::CompositeParts {
                    whole: ".price--selling .price__whole".to_string(),
                    fraction: ".price--selling .price__fraction".to_string(),
                },
                PriceStrategy::Text {
                    selector: ".price--selling".to_string(),
                },
                PriceStrategy::Text {
                    selector: "span.price".to_string(),
                },
                PriceStrategy::AncestorText {
                    selector: "span.price".to_string(),
                    max_hops: 3,
                },
            ],
            buying_price: vec![
                PriceStrategy::CompositeParts {
                    whole: ".price--buying .price__whole".to_string(),
                    fraction: ".price--buying .price__fraction".to_string(),
                },
                PriceStrategy::Text {
                    selector: ".price--buying".to_string(),
                },
            ],
        }
    }
}
