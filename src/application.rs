//! Application layer - run orchestration
//!
//! Public exports are defined here for convenience.

pub mod use_cases;

pub use use_cases::{RunSummary, ScrapeUseCase};
