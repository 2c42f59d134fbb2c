//! # citypulse-forecast
//!
//! The Smoothed Forecast Engine: walks a fixed 15-minute grid over the
//! requested horizon, derives a smoothed trajectory per resource axis from
//! the zone baselines, injects bounded variance, and classifies the stress
//! trend. Stateless per call; never fails for a valid horizon.

mod engine;
mod stress;

pub use engine::ForecastEngine;
pub use stress::composite_stress;
