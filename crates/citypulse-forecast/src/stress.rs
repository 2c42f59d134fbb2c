//! Composite stress scoring from predicted axis values.

/// Weighted stress composite over the four clamped axis predictions.
///
/// Each axis maps linearly onto a 0-100 sub-score capped at 100; sub-scores
/// may run negative below their intercept and only the final composite is
/// floored at 0. Weights: noise 0.40, temperature 0.25, air quality 0.20,
/// crowd 0.15.
pub fn composite_stress(noise: f64, temp: f64, aqi: f64, crowd: f64) -> u8 {
    let noise_score = (((noise - 40.0) / 60.0) * 100.0).min(100.0);
    let temp_score = (((temp - 15.0) / 25.0) * 100.0).min(100.0);
    let aqi_score = ((aqi / 150.0) * 100.0).min(100.0);
    let crowd_score = ((crowd / 30.0) * 100.0).min(100.0);

    let composite = noise_score * 0.40 + temp_score * 0.25 + aqi_score * 0.20 + crowd_score * 0.15;
    composite.round().max(0.0).min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_night_scores_low() {
        // Residential night baseline
        let stress = composite_stress(35.0, 21.0, 65.0, 2.0);
        assert!(stress < 30);
    }

    #[test]
    fn test_busy_afternoon_scores_moderate() {
        // Commercial afternoon baseline
        let stress = composite_stress(65.0, 32.0, 95.0, 15.0);
        assert!((40..=70).contains(&stress));
    }

    #[test]
    fn test_saturated_axes_cap_at_100() {
        assert_eq!(composite_stress(95.0, 45.0, 200.0, 35.0), 97);
        // Past every cap the sub-scores saturate
        assert_eq!(composite_stress(500.0, 500.0, 5000.0, 500.0), 100);
    }

    #[test]
    fn test_floor_applies_to_composite_only() {
        // All axes at their physical minimums: negative sub-scores pull the
        // composite down, and the floor catches it at 0.
        assert_eq!(composite_stress(30.0, 10.0, 20.0, 0.0), 0);
    }
}
