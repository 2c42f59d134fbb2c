//! Static city configuration and the baseline provider.
//!
//! Baselines derive from CPCB reference data and observed local urban
//! patterns for Mohali. The whole table is an immutable value constructed
//! once at process start and shared by reference into both engines; the
//! provider methods are pure functions of (node, time).

use crate::model::Baseline;
use crate::time::{Season, TimeSlot};

/// Land-use classification driving baseline expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Commercial,
    Residential,
    Mixed,
}

/// Expected sensor values for each time slot within one zone.
#[derive(Debug, Clone, Copy)]
pub struct SlotProfile {
    pub morning: Baseline,
    pub afternoon: Baseline,
    pub evening: Baseline,
    pub night: Baseline,
}

impl SlotProfile {
    pub fn get(&self, slot: TimeSlot) -> &Baseline {
        match slot {
            TimeSlot::Morning => &self.morning,
            TimeSlot::Afternoon => &self.afternoon,
            TimeSlot::Evening => &self.evening,
            TimeSlot::Night => &self.night,
        }
    }
}

/// Per-signal critical cutoffs and stress cutoffs.
///
/// Immutable for the process lifetime; shared read-only by all calls.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub noise_critical: f64,
    pub temp_critical: f64,
    pub aqi_critical: f64,
    pub crowd_critical: f64,
    pub stress_elevated: u8,
    pub stress_critical: u8,
}

/// A fixed monitoring node: short code, zone, display name.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: String,
    pub zone: Zone,
    pub name: String,
}

/// The full city configuration: zone baseline tables, seasonal multipliers,
/// thresholds, and the node registry (in declaration order).
#[derive(Debug, Clone)]
pub struct CityConfig {
    commercial: SlotProfile,
    residential: SlotProfile,
    mixed: SlotProfile,
    thresholds: Thresholds,
    nodes: Vec<NodeInfo>,
}

impl CityConfig {
    /// The Mohali deployment configuration.
    pub fn mohali() -> Self {
        Self {
            commercial: SlotProfile {
                morning: Baseline::new(55.0, 24.0, 80.0, 8.0),
                afternoon: Baseline::new(65.0, 32.0, 95.0, 15.0),
                evening: Baseline::new(70.0, 28.0, 90.0, 20.0),
                night: Baseline::new(45.0, 22.0, 70.0, 3.0),
            },
            residential: SlotProfile {
                morning: Baseline::new(45.0, 23.0, 75.0, 5.0),
                afternoon: Baseline::new(50.0, 31.0, 85.0, 8.0),
                evening: Baseline::new(55.0, 27.0, 80.0, 12.0),
                night: Baseline::new(35.0, 21.0, 65.0, 2.0),
            },
            mixed: SlotProfile {
                morning: Baseline::new(50.0, 24.0, 78.0, 6.0),
                afternoon: Baseline::new(58.0, 32.0, 90.0, 12.0),
                evening: Baseline::new(65.0, 28.0, 85.0, 18.0),
                night: Baseline::new(40.0, 21.0, 68.0, 3.0),
            },
            thresholds: Thresholds {
                noise_critical: 85.0,
                temp_critical: 38.0,
                aqi_critical: 150.0,
                crowd_critical: 25.0,
                stress_elevated: 55,
                stress_critical: 80,
            },
            nodes: vec![
                node("CP-MOH-01", Zone::Commercial, "IT Park Sector 70"),
                node("CP-MOH-02", Zone::Residential, "Phase 11"),
                node("CP-MOH-03", Zone::Mixed, "Phase 7"),
                node("CP-MOH-04", Zone::Residential, "Sector 77"),
                node("CP-MOH-05", Zone::Commercial, "Phase 3B2"),
            ],
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// All configured nodes, in table-declared order.
    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn node(&self, node_id: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Zone for a node; unknown nodes fall back to mixed.
    pub fn node_zone(&self, node_id: &str) -> Zone {
        self.node(node_id).map(|n| n.zone).unwrap_or(Zone::Mixed)
    }

    /// Display name for a node; unknown nodes get a generic phrase.
    pub fn node_name(&self, node_id: &str) -> &str {
        self.node(node_id).map(|n| n.name.as_str()).unwrap_or("this sector")
    }

    pub fn zone_profile(&self, zone: Zone) -> &SlotProfile {
        match zone {
            Zone::Commercial => &self.commercial,
            Zone::Residential => &self.residential,
            Zone::Mixed => &self.mixed,
        }
    }

    /// Seasonal (temp, aqi) multipliers. Winter aqi runs high due to crop
    /// burning.
    pub fn seasonal_adjustment(season: Season) -> (f64, f64) {
        match season {
            Season::Summer => (1.2, 1.1),
            Season::Monsoon => (0.85, 0.8),
            Season::Winter => (0.7, 1.3),
            Season::Spring => (1.0, 1.0),
        }
    }

    /// Expected sensor values for (node, hour, month).
    ///
    /// Zone- and season-adjusted; pure, never errors. Unknown node ids
    /// resolve to the mixed-zone profile.
    pub fn baseline(&self, node_id: &str, hour: u32, month: Option<u32>) -> Baseline {
        let zone = self.node_zone(node_id);
        let slot = TimeSlot::from_hour(hour);
        let mut baseline = *self.zone_profile(zone).get(slot);

        if let Some(month) = month {
            let (temp_mul, aqi_mul) = Self::seasonal_adjustment(Season::from_month(month));
            baseline.temp *= temp_mul;
            baseline.aqi *= aqi_mul;
        }

        baseline
    }

    /// Every (zone, slot) baseline in the table, unadjusted.
    ///
    /// Training samples are drawn around each of these.
    pub fn slot_baselines(&self) -> Vec<Baseline> {
        [&self.commercial, &self.residential, &self.mixed]
            .iter()
            .flat_map(|profile| {
                [
                    profile.morning,
                    profile.afternoon,
                    profile.evening,
                    profile.night,
                ]
            })
            .collect()
    }
}

impl Default for CityConfig {
    fn default() -> Self {
        Self::mohali()
    }
}

fn node(id: &str, zone: Zone, name: &str) -> NodeInfo {
    NodeInfo {
        id: id.to_string(),
        zone,
        name: name.to_string(),
    }
}
