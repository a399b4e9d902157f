//! HTML parsing infrastructure for catalog price extraction
//!
//! Trait-free, selector-chain based extraction with comprehensive error
//! handling: compiled fallback chains resolve the unstable fields, price
//! text goes through locale normalization, and every recoverable failure
//! drops a single entry rather than the run.

pub mod error;
pub mod observation_parser;
pub mod price;
pub mod selectors;

// Re-export public types
pub use error::{ExtractionError, ExtractionResult};
pub use observation_parser::ObservationParser;
pub use price::{EmbeddedPrices, PriceParseError, decode_embedded_prices, normalize_price};
pub use selectors::{PriceStrategy, SelectorConfig};
