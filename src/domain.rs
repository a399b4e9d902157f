//! Domain module - core entities of the price observer
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod observation;

pub use observation::{ObservationBatch, ProductObservation};
