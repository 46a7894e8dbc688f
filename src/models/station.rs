use serde::Serialize;

use crate::error::{ProcessingError, Result};
use crate::models::{FixedPoint, Measurements};

/// Final min/mean/max for one station, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationSummary {
    pub station: String,
    pub min: FixedPoint,
    pub mean: FixedPoint,
    pub max: FixedPoint,
    pub count: u64,
}

impl StationSummary {
    /// Station names are opaque bytes; anything that is not UTF-8 is
    /// replaced lossily in this representation.
    pub fn from_measurements(station: &[u8], measurements: &Measurements) -> Result<Self> {
        let name = String::from_utf8_lossy(station).into_owned();

        match (measurements.min(), measurements.mean(), measurements.max()) {
            (Some(min), Some(mean), Some(max)) => Ok(Self {
                station: name,
                min,
                mean,
                max,
                count: measurements.count(),
            }),
            _ => Err(ProcessingError::EmptyAccumulator { station: name }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_measurements() {
        let mut measurements = Measurements::new();
        measurements.record(FixedPoint::from_tenths(-12));
        measurements.record(FixedPoint::from_tenths(4));

        let summary = StationSummary::from_measurements(b"Oslo", &measurements).unwrap();

        assert_eq!(summary.station, "Oslo");
        assert_eq!(summary.min.to_string(), "-1.2");
        assert_eq!(summary.mean.to_string(), "-0.4");
        assert_eq!(summary.max.to_string(), "0.4");
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn test_empty_measurements_are_an_invariant_violation() {
        let result = StationSummary::from_measurements(b"Nowhere", &Measurements::new());

        assert!(matches!(
            result,
            Err(ProcessingError::EmptyAccumulator { station }) if station == "Nowhere"
        ));
    }
}
