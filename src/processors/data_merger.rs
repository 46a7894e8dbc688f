use crate::models::{StationMap, StationTable};

/// Folds per-worker station maps into one ordered table.
pub struct DataMerger;

impl DataMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge all partial maps. Accumulator merging is commutative and
    /// associative, so the order of `partials` does not affect the result.
    pub fn merge_station_maps<I>(&self, partials: I) -> StationTable
    where
        I: IntoIterator<Item = StationMap>,
    {
        let mut table = StationTable::new();

        for partial in partials {
            for (station, measurements) in partial {
                table.entry(station).or_default().merge(&measurements);
            }
        }

        table
    }

    /// Total number of records across all stations.
    pub fn record_count(&self, table: &StationTable) -> u64 {
        table.values().map(|m| m.count()).sum()
    }
}

impl Default for DataMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FixedPoint, Measurements};

    fn partial(entries: &[(&str, Vec<i64>)]) -> StationMap {
        let mut map = StationMap::default();
        for (station, values) in entries {
            let mut measurements = Measurements::new();
            for &value in values {
                measurements.record(FixedPoint::from_tenths(value));
            }
            map.insert(station.as_bytes().into(), measurements);
        }
        map
    }

    #[test]
    fn test_merge_combines_shared_keys() {
        let merger = DataMerger::new();
        let table = merger.merge_station_maps(vec![
            partial(&[("A", vec![10]), ("B", vec![-25])]),
            partial(&[("A", vec![30])]),
        ]);

        assert_eq!(table.len(), 2);
        let a = &table[b"A".as_slice()];
        assert_eq!(a.count(), 2);
        assert_eq!(a.min(), Some(FixedPoint::from_tenths(10)));
        assert_eq!(a.max(), Some(FixedPoint::from_tenths(30)));
        assert_eq!(merger.record_count(&table), 3);
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let merger = DataMerger::new();
        let first = || partial(&[("Oslo", vec![-12, 4]), ("Lima", vec![190])]);
        let second = || partial(&[("Oslo", vec![-70]), ("Kyiv", vec![55, 56])]);
        let third = || partial(&[("Lima", vec![181, 170]), ("Kyiv", vec![-3])]);

        let forward = merger.merge_station_maps(vec![first(), second(), third()]);
        let backward = merger.merge_station_maps(vec![third(), second(), first()]);
        let shuffled = merger.merge_station_maps(vec![second(), third(), first()]);

        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_table_is_sorted_by_key_bytes() {
        let merger = DataMerger::new();
        let table = merger.merge_station_maps(vec![partial(&[
            ("b", vec![1]),
            ("B", vec![1]),
            ("a", vec![1]),
            ("Ab", vec![1]),
            ("A", vec![1]),
        ])]);

        let keys: Vec<&[u8]> = table.keys().map(|k| k.as_ref()).collect();
        let expected: Vec<&[u8]> = ["A", "Ab", "B", "a", "b"]
            .iter()
            .map(|s| s.as_bytes())
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_no_partials_gives_empty_table() {
        let table = DataMerger::new().merge_station_maps(Vec::new());
        assert!(table.is_empty());
    }
}
