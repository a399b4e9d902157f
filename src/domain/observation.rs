//! Per-product price observations produced by one scrape run.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One validated price observation for a single catalog entry.
///
/// An observation only exists when a selling price was resolved; entries
/// without one are dropped during assembly and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductObservation {
    /// Capture instant, shared by every observation of the same batch.
    pub timestamp: DateTime<Utc>,

    /// Non-empty display name of the product.
    pub product_name: String,

    /// Price the shop sells at. Always present.
    pub selling_price: Decimal,

    /// Price the shop buys back at. `None` is meaningful: it is forced
    /// whenever the entry is flagged out of stock, and persisted as an
    /// empty cell.
    pub buying_price: Option<Decimal>,

    /// Catalog entry link; empty when the entry is not a hyperlink.
    pub source_url: String,

    /// Stock flag as read from the markup. Persisted only implicitly,
    /// through the absent buying price.
    pub is_out_of_stock: bool,
}

impl ProductObservation {
    /// Out-of-stock entries must never carry a buying price.
    pub fn satisfies_stock_invariant(&self) -> bool {
        !self.is_out_of_stock || self.buying_price.is_none()
    }
}

/// The set of observations produced by one assembly pass.
///
/// Held in memory only; terminal once merged into the history store.
#[derive(Debug, Clone)]
pub struct ObservationBatch {
    /// Capture timestamp taken once at the start of assembly.
    pub captured_at: DateTime<Utc>,

    /// Observations in document order.
    pub observations: Vec<ProductObservation>,
}

impl ObservationBatch {
    pub fn new(captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            observations: Vec::new(),
        }
    }

    pub fn push(&mut self, observation: ProductObservation) {
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn observation(out_of_stock: bool, buying: Option<Decimal>) -> ProductObservation {
        ProductObservation {
            timestamp: Utc::now(),
            product_name: "Coin X".to_string(),
            selling_price: Decimal::new(12500, 2),
            buying_price: buying,
            source_url: String::new(),
            is_out_of_stock: out_of_stock,
        }
    }

    #[test]
    fn stock_invariant_holds_for_in_stock_with_buying_price() {
        assert!(observation(false, Some(Decimal::new(12000, 2))).satisfies_stock_invariant());
    }

    #[test]
    fn stock_invariant_rejects_out_of_stock_with_buying_price() {
        assert!(!observation(true, Some(Decimal::new(12000, 2))).satisfies_stock_invariant());
    }

    #[test]
    fn stock_invariant_allows_out_of_stock_without_buying_price() {
        assert!(observation(true, None).satisfies_stock_invariant());
    }
}
