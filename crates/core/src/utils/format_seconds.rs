use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeScale {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    #[serde(other)]
    Unknown,
}

impl TimeScale {
    pub fn multiplier(&self) -> u64 {
        match self {
            TimeScale::Minutes => 60,
            TimeScale::Hours => 3_600,
            TimeScale::Days => 86_400,
            TimeScale::Weeks => 604_800,
            // Average month, 365.25 / 12 days.
            TimeScale::Months => 2_629_800,
            TimeScale::Unknown => 0,
        }
    }
}

/// Converts `value` units of `scale` into seconds. Non-positive or NaN values give 0.
pub fn format_seconds(value: f64, scale: TimeScale) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    (value * scale.multiplier() as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SCALES: [TimeScale; 6] = [
        TimeScale::Minutes,
        TimeScale::Hours,
        TimeScale::Days,
        TimeScale::Weeks,
        TimeScale::Months,
        TimeScale::Unknown,
    ];

    #[test]
    fn zero_and_negative_values_are_zero() {
        for scale in ALL_SCALES {
            assert_eq!(format_seconds(0.0, scale), 0);
            assert_eq!(format_seconds(-5.0, scale), 0);
            assert_eq!(format_seconds(f64::NAN, scale), 0);
        }
    }

    #[test]
    fn multiplies_by_scale() {
        assert_eq!(format_seconds(2.0, TimeScale::Minutes), 120);
        assert_eq!(format_seconds(3.0, TimeScale::Hours), 10_800);
        assert_eq!(format_seconds(1.0, TimeScale::Days), 86_400);
        assert_eq!(format_seconds(2.0, TimeScale::Weeks), 1_209_600);
        assert_eq!(format_seconds(1.0, TimeScale::Months), 2_629_800);
        assert_eq!(format_seconds(1.5, TimeScale::Hours), 5_400);
    }

    #[test]
    fn unknown_scale_has_no_multiplier() {
        let scale: TimeScale = serde_json::from_str("\"fortnights\"").unwrap();
        assert_eq!(scale, TimeScale::Unknown);
        assert_eq!(format_seconds(4.0, scale), 0);
    }
}
