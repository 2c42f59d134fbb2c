//! Wire-level data model shared by the anomaly and forecast engines.

use crate::error::{PulseError, Result};
use crate::time::TimeSlot;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One sensor reading from a monitoring node.
///
/// Ephemeral: owned by the calling request scope, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub node_id: String,
    /// Noise level in dB
    pub noise: f64,
    /// Ambient temperature in °C
    pub temperature: f64,
    /// Air quality index
    pub air_quality: f64,
    /// People count in sensor range
    pub crowd_density: f64,
    /// Pre-computed composite urban-stress score (0-100)
    pub stress_index: u8,
}

impl Reading {
    /// Validate field values. Non-finite or out-of-range fields are a
    /// caller-input error and fail fast.
    pub fn validate(&self) -> Result<()> {
        if !self.noise.is_finite() {
            return Err(invalid("noise", "must be a finite number"));
        }
        if !self.temperature.is_finite() {
            return Err(invalid("temperature", "must be a finite number"));
        }
        if !self.air_quality.is_finite() || self.air_quality < 0.0 {
            return Err(invalid("air_quality", "must be a non-negative number"));
        }
        if !self.crowd_density.is_finite() || self.crowd_density < 0.0 {
            return Err(invalid("crowd_density", "must be a non-negative number"));
        }
        if self.stress_index > 100 {
            return Err(invalid("stress_index", "must be in 0..=100"));
        }
        Ok(())
    }

    /// Raw observed values in feature order (noise, temp, aqi, crowd).
    pub fn features(&self) -> [f64; 4] {
        [
            self.noise,
            self.temperature,
            self.air_quality,
            self.crowd_density,
        ]
    }
}

fn invalid(field: &'static str, reason: &str) -> PulseError {
    PulseError::InvalidReading {
        field,
        reason: reason.to_string(),
    }
}

/// Expected sensor values for a (node, time, season) combination.
///
/// Computed fresh per call by the baseline provider; never mutated after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub noise: f64,
    pub temp: f64,
    pub aqi: f64,
    pub crowd: f64,
}

impl Baseline {
    pub const fn new(noise: f64, temp: f64, aqi: f64, crowd: f64) -> Self {
        Self {
            noise,
            temp,
            aqi,
            crowd,
        }
    }
}

/// A deviation category contributing to an anomaly verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Noise,
    Heat,
    AirQuality,
    Crowd,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalKind::Noise => "noise",
            SignalKind::Heat => "heat",
            SignalKind::AirQuality => "air_quality",
            SignalKind::Crowd => "crowd",
        };
        f.write_str(label)
    }
}

/// Observed value, its baseline, and their difference for one raised signal.
///
/// `deviation` is observed − baseline at full precision; rounding happens
/// only in the rendered explanation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub value: f64,
    pub baseline: f64,
    pub deviation: f64,
}

impl Deviation {
    pub fn new(value: f64, baseline: f64) -> Self {
        Self {
            value,
            baseline,
            deviation: value - baseline,
        }
    }
}

/// The anomaly engine's output for one reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub is_anomaly: bool,
    /// Fused anomaly score in [0, 1], rounded to 3 decimals
    pub anomaly_score: f64,
    pub signals: Vec<SignalKind>,
    pub deviations: BTreeMap<SignalKind, Deviation>,
    pub explanation: String,
    pub baseline: Baseline,
    pub time_context: TimeSlot,
    pub stress_index: u8,
}

/// One step of a forecast trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Local>,
    /// Offset from the forecast origin, a multiple of the 15-minute step
    pub minutes_ahead: u32,
    pub predicted_stress: u8,
    pub predicted_noise: f64,
    pub predicted_temp: f64,
    pub predicted_aqi: u32,
    pub predicted_crowd: u32,
    /// Decays linearly with horizon, floored; 2 decimals
    pub confidence: f64,
}

/// Direction of the stress trajectory over a forecast series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// A full per-node forecast: time-ascending, fixed-step points plus the
/// classified stress trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub node_id: String,
    pub node_name: String,
    pub forecast: Vec<ForecastPoint>,
    pub trend: Trend,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reading() -> Reading {
        Reading {
            node_id: "CP-MOH-01".to_string(),
            noise: 62.0,
            temperature: 29.5,
            air_quality: 95.0,
            crowd_density: 12.0,
            stress_index: 40,
        }
    }

    #[test]
    fn test_valid_reading_passes() {
        assert!(sample_reading().validate().is_ok());
    }

    #[test]
    fn test_non_finite_noise_rejected() {
        let mut reading = sample_reading();
        reading.noise = f64::NAN;
        let err = reading.validate().unwrap_err();
        assert!(err.to_string().contains("noise"));
    }

    #[test]
    fn test_negative_crowd_rejected() {
        let mut reading = sample_reading();
        reading.crowd_density = -1.0;
        assert!(reading.validate().is_err());
    }

    #[test]
    fn test_stress_index_over_100_rejected() {
        let mut reading = sample_reading();
        reading.stress_index = 101;
        assert!(reading.validate().is_err());
    }

    #[test]
    fn test_deviation_is_exact_difference() {
        let dev = Deviation::new(90.0, 65.3);
        assert_eq!(dev.deviation, 90.0 - 65.3);
    }

    #[test]
    fn test_signal_serializes_snake_case() {
        let json = serde_json::to_string(&SignalKind::AirQuality).unwrap();
        assert_eq!(json, "\"air_quality\"");
    }

    #[test]
    fn test_reading_deserializes_from_integer_json() {
        let json = r#"{
            "node_id": "CP-MOH-03",
            "noise": 58,
            "temperature": 31,
            "air_quality": 90,
            "crowd_density": 12,
            "stress_index": 45
        }"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.noise, 58.0);
        assert_eq!(reading.stress_index, 45);
    }
}
