//! Locale-tolerant normalization of raw price text.
//!
//! Catalog prices arrive as display strings ("125,00 лв.", "$12.50"),
//! sometimes only as a machine-readable attribute payload. Normalization
//! turns the display form into a canonical decimal; the embedded payload
//! is decoded separately and consulted only after a text parse failed.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Per-field, recoverable failure of price text normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    #[error("price text is empty after stripping currency markers")]
    Empty,

    #[error("price text '{text}' is not numeric")]
    NotNumeric { text: String },

    #[error("price '{value}' is negative")]
    Negative { value: Decimal },
}

/// Normalize locale-formatted price text into a canonical decimal.
///
/// Strips every configured currency marker and all whitespace (including
/// non-breaking spaces), converts a locale decimal comma to a decimal
/// point, and parses the remainder. A value of exactly zero parses
/// successfully; zero and "unparseable" are distinct outcomes and only
/// the latter sends the caller to its fallback.
pub fn normalize_price(
    text: &str,
    currency_markers: &[String],
) -> Result<Decimal, PriceParseError> {
    let mut cleaned = text.to_string();
    for marker in currency_markers {
        cleaned = cleaned.replace(marker.as_str(), "");
    }

    let cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.replace(',', ".");

    if cleaned.is_empty() {
        return Err(PriceParseError::Empty);
    }

    let value: Decimal = cleaned.parse().map_err(|_| PriceParseError::NotNumeric {
        text: text.trim().to_string(),
    })?;

    if value.is_sign_negative() {
        return Err(PriceParseError::Negative { value });
    }

    Ok(value)
}

/// Machine-readable price payload attached to an entry node
/// (e.g. `data-prices='{"sell": "125.00", "buy": "120.00"}'`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedPrices {
    #[serde(default)]
    pub sell: Option<Decimal>,

    #[serde(default)]
    pub buy: Option<Decimal>,
}

/// Decode the embedded price attribute. Undecodable payloads are reported
/// as absent; the entry then falls back to the normal drop policy.
pub fn decode_embedded_prices(raw: &str) -> Option<EmbeddedPrices> {
    match serde_json::from_str::<EmbeddedPrices>(raw) {
        Ok(prices) => Some(prices),
        Err(e) => {
            debug!("Undecodable embedded price payload: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec![
            "лв.".to_string(),
            "BGN".to_string(),
            "$".to_string(),
            "€".to_string(),
        ]
    }

    #[test]
    fn normalizes_comma_decimal_with_lev_marker() {
        let value = normalize_price("125,00 лв.", &markers()).unwrap();
        assert_eq!(value, Decimal::new(12500, 2));
    }

    #[test]
    fn normalizes_dollar_marker_with_point_decimal() {
        let value = normalize_price("$12.50", &markers()).unwrap();
        assert_eq!(value, Decimal::new(1250, 2));
    }

    #[test]
    fn same_amount_is_equal_across_markers() {
        let lev = normalize_price("12,50 лв.", &markers()).unwrap();
        let dollar = normalize_price("$12.50", &markers()).unwrap();
        assert_eq!(lev, dollar);
    }

    #[test]
    fn tolerates_embedded_and_non_breaking_whitespace() {
        let value = normalize_price(" 1250,00\u{a0}лв. ", &markers()).unwrap();
        assert_eq!(value, Decimal::new(125000, 2));
    }

    #[test]
    fn zero_is_a_valid_price() {
        let value = normalize_price("0,00 лв.", &markers()).unwrap();
        assert_eq!(value, Decimal::ZERO);
    }

    #[test]
    fn empty_text_is_reported_empty() {
        assert_eq!(normalize_price("  лв. ", &markers()), Err(PriceParseError::Empty));
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        let err = normalize_price("по заявка", &markers()).unwrap_err();
        assert!(matches!(err, PriceParseError::NotNumeric { .. }));
    }

    #[test]
    fn negative_values_are_rejected() {
        let err = normalize_price("-5,00 лв.", &markers()).unwrap_err();
        assert!(matches!(err, PriceParseError::Negative { .. }));
    }

    #[test]
    fn decodes_embedded_prices_from_strings_and_numbers() {
        let prices = decode_embedded_prices(r#"{"sell": "125.00", "buy": 120.0}"#).unwrap();
        assert_eq!(prices.sell, Some(Decimal::new(12500, 2)));
        assert_eq!(prices.buy, Some(Decimal::new(1200, 1)));
    }

    #[test]
    fn partial_embedded_payload_keeps_missing_fields_absent() {
        let prices = decode_embedded_prices(r#"{"sell": "45.99"}"#).unwrap();
        assert_eq!(prices.sell, Some(Decimal::new(4599, 2)));
        assert_eq!(prices.buy, None);
    }

    #[test]
    fn garbage_embedded_payload_is_absent() {
        assert!(decode_embedded_prices("not json").is_none());
    }
}
