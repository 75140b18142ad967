//! External service integrations

pub mod detector;
pub mod dispatch;
pub mod weather;

pub use detector::{HttpDetectorClient, PestDetector};
pub use dispatch::{AlertDispatcher, LogDispatcher, WebhookDispatcher};
pub use weather::{OpenMeteoClient, WeatherProvider};
