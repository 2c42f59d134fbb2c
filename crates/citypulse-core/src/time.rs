//! Time-of-day and seasonal mapping
//!
//! Hours map onto four coarse slots that index the zone baseline tables;
//! months map onto the four local seasons driving the temp/aqi multipliers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse time-of-day slot used to index baseline tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    /// Map an hour-of-day (0..24) to its slot.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeSlot::Morning,
            12..=16 => TimeSlot::Afternoon,
            17..=21 => TimeSlot::Evening,
            _ => TimeSlot::Night,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
            TimeSlot::Night => "night",
        };
        f.write_str(label)
    }
}

/// Local season, derived from month-of-year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Monsoon,
    Winter,
    Spring,
}

impl Season {
    /// Map a calendar month (1..=12) to its season.
    pub fn from_month(month: u32) -> Self {
        match month {
            4..=6 => Season::Summer,
            7..=9 => Season::Monsoon,
            10..=12 | 1 => Season::Winter,
            _ => Season::Spring,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_boundaries() {
        assert_eq!(TimeSlot::from_hour(5), TimeSlot::Night);
        assert_eq!(TimeSlot::from_hour(6), TimeSlot::Morning);
        assert_eq!(TimeSlot::from_hour(11), TimeSlot::Morning);
        assert_eq!(TimeSlot::from_hour(12), TimeSlot::Afternoon);
        assert_eq!(TimeSlot::from_hour(16), TimeSlot::Afternoon);
        assert_eq!(TimeSlot::from_hour(17), TimeSlot::Evening);
        assert_eq!(TimeSlot::from_hour(21), TimeSlot::Evening);
        assert_eq!(TimeSlot::from_hour(22), TimeSlot::Night);
        assert_eq!(TimeSlot::from_hour(0), TimeSlot::Night);
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(TimeSlot::Afternoon.to_string(), "afternoon");
        assert_eq!(TimeSlot::Night.to_string(), "night");
    }

    #[test]
    fn test_season_mapping() {
        assert_eq!(Season::from_month(5), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Monsoon);
        assert_eq!(Season::from_month(11), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Spring);
        assert_eq!(Season::from_month(3), Season::Spring);
    }
}
