//! Deterministic explanation synthesis for anomaly verdicts.
//!
//! Each raised signal contributes one clause in natural units; deviations
//! are rendered at one decimal while the structured verdict keeps full
//! precision.

use citypulse_core::{Deviation, SignalKind, Thresholds, TimeSlot};
use std::collections::BTreeMap;

pub(crate) fn render(
    location: &str,
    slot: TimeSlot,
    signals: &[SignalKind],
    deviations: &BTreeMap<SignalKind, Deviation>,
    stress_index: u8,
    thresholds: &Thresholds,
) -> String {
    if signals.is_empty() {
        if stress_index <= thresholds.stress_elevated {
            return format!(
                "Sensing parameters nominal for {slot} at {location}. No intervention required."
            );
        }
        return format!(
            "Stress index {stress_index} elevated at {location} during {slot}. \
             No critical sensor deviations; monitoring."
        );
    }

    let severity = if stress_index > thresholds.stress_critical {
        "CRITICAL"
    } else {
        "ELEVATED"
    };

    let clauses: Vec<String> = signals
        .iter()
        .filter_map(|signal| deviations.get(signal).map(|dev| clause(*signal, dev, slot)))
        .collect();

    format!("{severity} at {location}: {}", clauses.join(". "))
}

fn clause(signal: SignalKind, dev: &Deviation, slot: TimeSlot) -> String {
    match signal {
        SignalKind::Noise => format!(
            "Noise {} dB is {:.1} dB above {slot} baseline",
            dev.value, dev.deviation
        ),
        SignalKind::Heat => format!(
            "Temperature {:.1}C indicates thermal stress ({:.1}C above baseline)",
            dev.value, dev.deviation
        ),
        SignalKind::AirQuality => format!(
            "AQI {:.0} exceeds safe levels (baseline: {:.0})",
            dev.value, dev.baseline
        ),
        SignalKind::Crowd => format!(
            "Crowd density {:.0} above typical {slot} levels",
            dev.value
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> Thresholds {
        Thresholds {
            noise_critical: 85.0,
            temp_critical: 38.0,
            aqi_critical: 150.0,
            crowd_critical: 25.0,
            stress_elevated: 55,
            stress_critical: 80,
        }
    }

    #[test]
    fn test_nominal_when_quiet() {
        let text = render(
            "Phase 11",
            TimeSlot::Morning,
            &[],
            &BTreeMap::new(),
            30,
            &thresholds(),
        );
        assert_eq!(
            text,
            "Sensing parameters nominal for morning at Phase 11. No intervention required."
        );
    }

    #[test]
    fn test_elevated_monitoring_without_signals() {
        let text = render(
            "Phase 7",
            TimeSlot::Evening,
            &[],
            &BTreeMap::new(),
            70,
            &thresholds(),
        );
        assert!(text.contains("Stress index 70 elevated"));
        assert!(text.contains("monitoring"));
    }

    #[test]
    fn test_single_noise_clause() {
        let mut deviations = BTreeMap::new();
        deviations.insert(SignalKind::Noise, Deviation::new(90.0, 65.0));
        let text = render(
            "IT Park Sector 70",
            TimeSlot::Afternoon,
            &[SignalKind::Noise],
            &deviations,
            40,
            &thresholds(),
        );
        assert_eq!(
            text,
            "ELEVATED at IT Park Sector 70: Noise 90 dB is 25.0 dB above afternoon baseline"
        );
    }

    #[test]
    fn test_fractional_noise_reading_is_not_rounded() {
        let mut deviations = BTreeMap::new();
        deviations.insert(SignalKind::Noise, Deviation::new(90.5, 65.0));
        let text = render(
            "IT Park Sector 70",
            TimeSlot::Afternoon,
            &[SignalKind::Noise],
            &deviations,
            40,
            &thresholds(),
        );
        assert_eq!(
            text,
            "ELEVATED at IT Park Sector 70: Noise 90.5 dB is 25.5 dB above afternoon baseline"
        );
    }

    #[test]
    fn test_critical_prefix_and_joined_clauses() {
        let mut deviations = BTreeMap::new();
        deviations.insert(SignalKind::Noise, Deviation::new(92.0, 65.0));
        deviations.insert(SignalKind::AirQuality, Deviation::new(180.0, 95.0));
        let text = render(
            "Phase 3B2",
            TimeSlot::Afternoon,
            &[SignalKind::Noise, SignalKind::AirQuality],
            &deviations,
            90,
            &thresholds(),
        );
        assert!(text.starts_with("CRITICAL at Phase 3B2: "));
        assert!(text.contains("Noise 92 dB"));
        assert!(text.contains("AQI 180 exceeds safe levels (baseline: 95)"));
        assert!(text.contains(". "));
    }
}
