//! Domain models for the Pest Outbreak Forecaster

mod alert;
mod detection;
mod farm;
mod favorability;
mod grid;
mod risk;
mod weather;

pub use alert::*;
pub use detection::*;
pub use farm::*;
pub use favorability::*;
pub use grid::*;
pub use risk::*;
pub use weather::*;
