//! HTTP request handlers

pub mod alerts;
pub mod detections;
pub mod farms;
pub mod forecast;
pub mod health;
pub mod weather;

pub use alerts::*;
pub use detections::*;
pub use farms::*;
pub use forecast::*;
pub use health::*;
pub use weather::*;
