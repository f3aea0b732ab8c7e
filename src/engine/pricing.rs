use serde::{Deserialize, Serialize};

use crate::model::{HOUR_MS, Ms};

/// Hour of day derived arithmetically; timestamps are facility-local by
/// convention, no clock is consulted.
pub fn hour_of_day(t: Ms) -> u8 {
    debug_assert!(t >= 0, "timestamps are non-negative");
    ((t / HOUR_MS) % 24) as u8
}

/// Inclusive hour range; `start > end` wraps past midnight (23-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourBand {
    pub start: u8,
    pub end: u8,
}

impl HourBand {
    pub fn new(start: u8, end: u8) -> Self {
        debug_assert!(start < 24 && end < 24, "hours are 0-23");
        Self { start, end }
    }

    pub fn contains(&self, hour: u8) -> bool {
        if self.start <= self.end {
            self.start <= hour && hour <= self.end
        } else {
            hour >= self.start || hour <= self.end
        }
    }
}

/// Time-of-day factor table. Peak wins when a peak and an off-peak band
/// overlap; hours in neither kind of band pay 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBands {
    pub peak: Vec<HourBand>,
    pub peak_factor: f64,
    pub off_peak: Vec<HourBand>,
    pub off_peak_factor: f64,
}

impl TimeBands {
    /// Weekday commuter profile: morning and evening rush at 1.5x, deep
    /// night at 0.7x.
    pub fn commuter() -> Self {
        TimeBands {
            peak: vec![HourBand::new(8, 10), HourBand::new(16, 19)],
            peak_factor: 1.5,
            off_peak: vec![HourBand::new(23, 5)],
            off_peak_factor: 0.7,
        }
    }

    /// No time-of-day variation.
    pub fn flat() -> Self {
        TimeBands {
            peak: Vec::new(),
            peak_factor: 1.0,
            off_peak: Vec::new(),
            off_peak_factor: 1.0,
        }
    }

    pub fn factor(&self, hour: u8) -> f64 {
        if self.peak.iter().any(|b| b.contains(hour)) {
            self.peak_factor
        } else if self.off_peak.iter().any(|b| b.contains(hour)) {
            self.off_peak_factor
        } else {
            1.0
        }
    }
}

/// How occupancy maps to a price multiplier. Injected wherever a rate
/// feeds a price, so the two historical shapes stay interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OccupancyCurve {
    /// `1 + slope * rate`, continuous.
    Linear { slope: f64 },
    /// Highest factor whose threshold the rate meets (`rate >= threshold`),
    /// 1.0 below the first step. Steps must be sorted by threshold.
    Stepped { steps: Vec<(f64, f64)> },
}

impl OccupancyCurve {
    pub fn linear() -> Self {
        OccupancyCurve::Linear { slope: 0.5 }
    }

    pub fn stepped() -> Self {
        OccupancyCurve::Stepped {
            steps: vec![(0.4, 1.1), (0.6, 1.3), (0.8, 1.5)],
        }
    }

    /// Build a stepped curve from steps in any order.
    pub fn from_steps(mut steps: Vec<(f64, f64)>) -> Self {
        steps.sort_by(|a, b| a.0.total_cmp(&b.0));
        debug_assert!(
            steps.windows(2).all(|w| w[0].1 <= w[1].1),
            "factors must be non-decreasing with threshold"
        );
        OccupancyCurve::Stepped { steps }
    }

    pub fn factor(&self, rate: f64) -> f64 {
        debug_assert!((0.0..=1.0).contains(&rate), "occupancy rate out of [0, 1]");
        match self {
            OccupancyCurve::Linear { slope } => 1.0 + slope * rate,
            OccupancyCurve::Stepped { steps } => steps
                .iter()
                .rev()
                .find(|(threshold, _)| rate >= *threshold)
                .map_or(1.0, |(_, factor)| *factor),
        }
    }
}

/// Premium multiplier for a spot's priority level, `1 + weight * priority`.
pub fn priority_factor(priority: u8, weight: f64) -> f64 {
    1.0 + weight * f64::from(priority)
}

/// Ceiling-hours billing: any started hour counts in full.
pub fn billable_hours(duration: Ms) -> i64 {
    debug_assert!(duration >= 0, "negative duration");
    (duration.max(0) + HOUR_MS - 1) / HOUR_MS
}

/// Round to cents.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Final charge: base rate times billed hours times both factors.
pub fn quote(base_rate: f64, hours: i64, time_factor: f64, occupancy_factor: f64) -> f64 {
    round2(base_rate * hours as f64 * time_factor * occupancy_factor)
}

/// Facility-level pricing configuration. Plain value, built by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub time_bands: TimeBands,
    pub occupancy_curve: OccupancyCurve,
    pub priority_weight: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            time_bands: TimeBands::commuter(),
            occupancy_curve: OccupancyCurve::stepped(),
            priority_weight: 0.1,
        }
    }
}
