//! The Smoothed Forecast Engine.
//!
//! Baselines jump discretely across time-slot boundaries; real readings
//! drift. Each axis therefore blends the new baseline with the previous
//! prediction (fixed-alpha exponential smoothing), then takes bounded
//! multiplicative jitter whose amplitude shrinks with distance, modeling
//! convergence toward the seasonal norm at longer horizons rather than
//! growing uncertainty. Every prediction is clamped to sensor bounds.

use crate::stress::composite_stress;
use chrono::{DateTime, Datelike, Duration, Local, Timelike};
use citypulse_core::{CityConfig, ForecastPoint, ForecastSeries, Trend};
use rand::Rng;
use std::sync::Arc;

/// Fixed grid step in minutes.
const STEP_MINUTES: u32 = 15;
/// Smoothing factor: predicted = alpha * baseline + (1 - alpha) * previous.
const SMOOTHING_ALPHA: f64 = 0.4;

/// Base multiplicative jitter amplitude at the forecast origin.
const JITTER_BASE: f64 = 0.05;
/// Jitter amplitude decays linearly over this many minutes...
const JITTER_DECAY_MINUTES: f64 = 960.0;
/// ...but never below this fraction of the base amplitude.
const JITTER_FLOOR_FACTOR: f64 = 0.3;
/// Temperature is less volatile than the base scale, air quality more so.
const TEMP_JITTER_SCALE: f64 = 0.5;
const AQI_JITTER_SCALE: f64 = 1.2;

const CONFIDENCE_START: f64 = 0.95;
const CONFIDENCE_DECAY_PER_MINUTE: f64 = 0.005;
const CONFIDENCE_FLOOR: f64 = 0.6;

/// Stress delta past which a series counts as increasing/decreasing.
const TREND_MARGIN: i32 = 10;

/// Physically plausible sensor ranges; smoothing and jitter cannot escape
/// these.
const NOISE_BOUNDS: (f64, f64) = (30.0, 95.0);
const TEMP_BOUNDS: (f64, f64) = (10.0, 45.0);
const AQI_BOUNDS: (f64, f64) = (20.0, 200.0);
const CROWD_BOUNDS: (f64, f64) = (0.0, 35.0);

/// Smoothed Forecast Engine. Stateless per call; shares only the immutable
/// city configuration.
pub struct ForecastEngine {
    config: Arc<CityConfig>,
}

impl ForecastEngine {
    pub fn new(config: Arc<CityConfig>) -> Self {
        Self { config }
    }

    /// Forecast one node over the horizon, starting at the current wall
    /// clock. Unknown nodes fall back to the mixed-zone baseline and a
    /// generic name; this never fails.
    pub fn predict_node(&self, node_id: &str, horizon_minutes: u32) -> ForecastSeries {
        self.predict_node_at(node_id, horizon_minutes, Local::now())
    }

    /// Forecast every configured node, in table-declared order.
    pub fn predict_all(&self, horizon_minutes: u32) -> Vec<ForecastSeries> {
        let now = Local::now();
        self.config
            .nodes()
            .iter()
            .map(|node| self.predict_node_at(&node.id, horizon_minutes, now))
            .collect()
    }

    /// Forecast one node as of an explicit origin instant.
    pub fn predict_node_at(
        &self,
        node_id: &str,
        horizon_minutes: u32,
        origin: DateTime<Local>,
    ) -> ForecastSeries {
        let mut rng = rand::thread_rng();
        let mut points = Vec::with_capacity((horizon_minutes / STEP_MINUTES + 1) as usize);
        // Previous predicted values per axis, post-jitter and post-clamp
        let mut previous: Option<[f64; 4]> = None;

        for minutes in (0..=horizon_minutes).step_by(STEP_MINUTES as usize) {
            let at = origin + Duration::minutes(i64::from(minutes));
            let baseline = self.config.baseline(node_id, at.hour(), Some(at.month()));
            let base = [baseline.noise, baseline.temp, baseline.aqi, baseline.crowd];

            let smoothed = match previous {
                None => base,
                Some(prev) => {
                    let mut next = [0.0; 4];
                    for axis in 0..4 {
                        next[axis] =
                            SMOOTHING_ALPHA * base[axis] + (1.0 - SMOOTHING_ALPHA) * prev[axis];
                    }
                    next
                }
            };

            let amplitude = JITTER_BASE
                * (1.0 - f64::from(minutes) / JITTER_DECAY_MINUTES).max(JITTER_FLOOR_FACTOR);
            let jitter_scale = [1.0, TEMP_JITTER_SCALE, AQI_JITTER_SCALE, 1.0];
            let bounds = [NOISE_BOUNDS, TEMP_BOUNDS, AQI_BOUNDS, CROWD_BOUNDS];

            let mut predicted = [0.0; 4];
            for axis in 0..4 {
                let amp = amplitude * jitter_scale[axis];
                let jittered = smoothed[axis] * (1.0 + rng.gen_range(-amp..=amp));
                predicted[axis] = jittered.clamp(bounds[axis].0, bounds[axis].1);
            }
            previous = Some(predicted);

            let confidence =
                (CONFIDENCE_START - f64::from(minutes) * CONFIDENCE_DECAY_PER_MINUTE)
                    .max(CONFIDENCE_FLOOR);

            points.push(ForecastPoint {
                timestamp: at,
                minutes_ahead: minutes,
                predicted_stress: composite_stress(
                    predicted[0],
                    predicted[1],
                    predicted[2],
                    predicted[3],
                ),
                predicted_noise: (predicted[0] * 10.0).round() / 10.0,
                predicted_temp: (predicted[1] * 10.0).round() / 10.0,
                predicted_aqi: predicted[2].round() as u32,
                predicted_crowd: predicted[3].round() as u32,
                confidence: (confidence * 100.0).round() / 100.0,
            });
        }

        let trend = classify_trend(&points);
        tracing::debug!(
            node = node_id,
            horizon = horizon_minutes,
            points = points.len(),
            %trend,
            "forecast series built"
        );

        ForecastSeries {
            node_id: node_id.to_string(),
            node_name: self.config.node_name(node_id).to_string(),
            forecast: points,
            trend,
        }
    }
}

/// First-versus-last stress comparison; short series are always stable.
fn classify_trend(points: &[ForecastPoint]) -> Trend {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Trend::Stable;
    };
    if points.len() < 2 {
        return Trend::Stable;
    }

    let delta = i32::from(last.predicted_stress) - i32::from(first.predicted_stress);
    if delta > TREND_MARGIN {
        Trend::Increasing
    } else if delta < -TREND_MARGIN {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn engine() -> ForecastEngine {
        ForecastEngine::new(Arc::new(CityConfig::mohali()))
    }

    fn origin() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 12, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_series_length_matches_horizon() {
        let engine = engine();
        for (horizon, expected) in [(0u32, 1usize), (15, 2), (30, 3), (60, 5), (100, 7)] {
            let series = engine.predict_node_at("CP-MOH-02", horizon, origin());
            assert_eq!(series.forecast.len(), expected, "horizon {horizon}");
        }
    }

    #[test]
    fn test_minutes_ahead_are_increasing_multiples_of_step() {
        let engine = engine();
        let series = engine.predict_node_at("CP-MOH-01", 120, origin());
        for (i, point) in series.forecast.iter().enumerate() {
            assert_eq!(point.minutes_ahead, i as u32 * 15);
        }
    }

    #[test]
    fn test_confidence_decays_toward_floor() {
        let engine = engine();
        let series = engine.predict_node_at("CP-MOH-02", 30, origin());
        let conf: Vec<f64> = series.forecast.iter().map(|p| p.confidence).collect();
        assert_eq!(conf.len(), 3);
        assert!(conf[0] > conf[1] && conf[1] > conf[2]);

        // Far-horizon confidence never drops below the floor.
        let long = engine.predict_node_at("CP-MOH-02", 10_000, origin());
        for point in &long.forecast {
            assert!(point.confidence >= 0.6);
        }
    }

    #[test]
    fn test_predictions_stay_within_sensor_bounds() {
        let engine = engine();
        for horizon in [0u32, 10_000] {
            let series = engine.predict_node_at("CP-MOH-05", horizon, origin());
            for point in &series.forecast {
                assert!((30.0..=95.0).contains(&point.predicted_noise));
                assert!((10.0..=45.0).contains(&point.predicted_temp));
                assert!((20..=200).contains(&point.predicted_aqi));
                assert!(point.predicted_crowd <= 35);
                assert!(point.predicted_stress <= 100);
            }
        }
    }

    #[test]
    fn test_zero_horizon_is_single_point_and_stable() {
        let engine = engine();
        let series = engine.predict_node_at("CP-MOH-03", 0, origin());
        assert_eq!(series.forecast.len(), 1);
        assert_eq!(series.trend, Trend::Stable);
    }

    #[test]
    fn test_first_point_tracks_the_baseline() {
        let engine = engine();
        // Commercial afternoon noise baseline is 65; jitter is at most 5%.
        let series = engine.predict_node_at("CP-MOH-01", 0, origin());
        let point = &series.forecast[0];
        assert!((point.predicted_noise - 65.0).abs() <= 65.0 * 0.05 + 0.1);
    }

    #[test]
    fn test_smoothing_holds_second_point_between_prev_and_baseline() {
        let engine = engine();
        // 05:45 -> 06:00 crosses night (noise 45) into morning (noise 55)
        // for a commercial node. With alpha 0.4 the second point cannot
        // reach the new baseline even at maximum upward jitter.
        let dawn = Local.with_ymd_and_hms(2024, 3, 12, 5, 45, 0).unwrap();
        let series = engine.predict_node_at("CP-MOH-01", 15, dawn);
        let second = series.forecast[1].predicted_noise;
        assert!(second < 55.0, "second point {second} jumped to new baseline");
        assert!(second > 42.0, "second point {second} below smoothing range");
    }

    #[test]
    fn test_all_nodes_in_declared_order() {
        let engine = engine();
        let all = engine.predict_all(15);
        assert_eq!(all.len(), 5);
        let ids: Vec<&str> = all.iter().map(|s| s.node_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["CP-MOH-01", "CP-MOH-02", "CP-MOH-03", "CP-MOH-04", "CP-MOH-05"]
        );
        for series in &all {
            assert_eq!(series.forecast.len(), 2);
        }
    }

    #[test]
    fn test_unknown_node_gets_generic_name() {
        let engine = engine();
        let series = engine.predict_node_at("CP-ZZZ-09", 30, origin());
        assert_eq!(series.node_name, "this sector");
        assert_eq!(series.forecast.len(), 3);
    }

    #[test]
    fn test_trend_classification_margins() {
        let stable = classify_trend(&[]);
        assert_eq!(stable, Trend::Stable);
    }
}
