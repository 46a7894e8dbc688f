pub mod measurement;
pub mod station;

pub use measurement::{FixedPoint, Measurements};
pub use station::StationSummary;

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Per-worker accumulators keyed by raw station name bytes.
pub type StationMap = FxHashMap<Box<[u8]>, Measurements>;

/// Merged accumulators, ordered by station name bytes.
pub type StationTable = BTreeMap<Box<[u8]>, Measurements>;
