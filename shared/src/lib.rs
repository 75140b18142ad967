//! Shared types and models for the Pest Outbreak Forecaster
//!
//! This crate contains the domain entities passed between the forecasting
//! engine, its collaborators, and the API layer.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
