use serde::{Serialize, Serializer};
use std::fmt;

use crate::utils::constants::FIXED_POINT_SCALE;

/// A decimal value with exactly one fractional digit, stored as tenths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i64);

impl FixedPoint {
    pub const fn from_tenths(tenths: i64) -> Self {
        Self(tenths)
    }

    pub const fn tenths(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / FIXED_POINT_SCALE as f64
    }
}

impl fmt::Display for FixedPoint {
    // Sign is written separately so that -0.4 keeps its minus.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let scale = FIXED_POINT_SCALE as u64;
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}.{}", magnitude / scale, magnitude % scale)
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

/// Running count/min/max/sum for one station, in tenths.
///
/// `count == 0` is the only empty state. Sums are accumulated as `i128`
/// so that no realistic record count can overflow them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measurements {
    count: u64,
    min: i64,
    max: i64,
    sum: i128,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: FixedPoint) -> Self {
        let mut measurements = Self::new();
        measurements.record(value);
        measurements
    }

    pub fn record(&mut self, value: FixedPoint) {
        let value = value.tenths();
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.sum = value as i128;
            self.count = 1;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
            self.sum += value as i128;
            self.count += 1;
        }
    }

    pub fn merge(&mut self, other: &Measurements) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Mean rounded half away from zero on the tenths digit, using
    /// integer arithmetic only.
    pub fn mean(&self) -> Option<FixedPoint> {
        if self.count == 0 {
            return None;
        }

        let scale = FIXED_POINT_SCALE as i128;
        let digits = (self.sum * scale) / self.count as i128;
        let mut tenths = digits / scale;
        if (digits % scale).abs() >= scale / 2 {
            tenths += digits.signum();
        }

        // The mean always lies within [min, max], so it fits in an i64.
        Some(FixedPoint::from_tenths(tenths as i64))
    }

    pub fn min(&self) -> Option<FixedPoint> {
        (self.count > 0).then_some(FixedPoint::from_tenths(self.min))
    }

    pub fn max(&self) -> Option<FixedPoint> {
        (self.count > 0).then_some(FixedPoint::from_tenths(self.max))
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i128 {
        self.sum
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
