//! Price domain: chart points, refresh modes, the rolling series buffer and
//! the controller that keeps it in sync with the market-data API.

#[cfg(feature = "http")]
pub mod client;
mod convert;
#[cfg(feature = "native")]
pub mod controller;
pub mod mode;
#[cfg(feature = "http")]
pub mod source;
pub mod state;
pub mod wire;

use serde::{Deserialize, Serialize};

pub use mode::Mode;
pub use state::{SeriesBuffer, SERIES_CAPACITY};

/// A single point on the price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp in milliseconds.
    pub time: i64,
    /// Formatted timestamp shown on the x-axis.
    pub label: String,
    /// Price in the quote currency.
    pub value: f64,
}

impl PricePoint {
    pub fn new(time: i64, label: impl Into<String>, value: f64) -> Self {
        Self {
            time,
            label: label.into(),
            value,
        }
    }
}
