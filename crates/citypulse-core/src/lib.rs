//! # citypulse-core
//!
//! Shared foundation for the CityPulse ML engines: the immutable city
//! configuration (zone baselines, seasonal adjustments, thresholds, node
//! registry), the baseline provider, the wire-level data model, and the
//! error taxonomy.
//!
//! The configuration is constructed once at process start and shared by
//! reference; nothing in this crate mutates after construction.

pub mod config;
mod error;
pub mod model;
pub mod time;

pub use config::{CityConfig, NodeInfo, Thresholds, Zone};
pub use error::{PulseError, Result};
pub use model::{
    AnomalyVerdict, Baseline, Deviation, ForecastPoint, ForecastSeries, Reading, SignalKind,
    Trend,
};
pub use time::{Season, TimeSlot};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{CityConfig, NodeInfo, Thresholds, Zone};
    pub use crate::error::{PulseError, Result};
    pub use crate::model::{
        AnomalyVerdict, Baseline, Deviation, ForecastPoint, ForecastSeries, Reading, SignalKind,
        Trend,
    };
    pub use crate::time::{Season, TimeSlot};
}
