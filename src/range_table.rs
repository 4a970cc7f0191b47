/// Tabulated firing data for one charge of one ammunition type
use serde::{Deserialize, Serialize};

/// One row of a range table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub distance_m: u32,
    pub elevation_mils: f64,
    pub time_s: f64,
    /// Elevation change per 100 m of altitude difference (mils)
    pub elevation_rate: f64,
}

impl From<(u32, f64, f64, f64)> for RangeEntry {
    fn from(row: (u32, f64, f64, f64)) -> Self {
        let (distance_m, elevation_mils, time_s, elevation_rate) = row;
        Self {
            distance_m,
            elevation_mils,
            time_s,
            elevation_rate,
        }
    }
}

/// Range table data structure
///
/// Rows are kept sorted by distance so bracketing can binary-search.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTable {
    entries: Vec<RangeEntry>,
    dispersion_m: f64,
}

impl RangeTable {
    /// Create a range table, sorting the rows by distance once.
    pub fn new(mut entries: Vec<RangeEntry>, dispersion_m: f64) -> Self {
        entries.sort_by_key(|e| e.distance_m);
        Self {
            entries,
            dispersion_m,
        }
    }

    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    pub fn dispersion_m(&self) -> f64 {
        self.dispersion_m
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn min_distance(&self) -> Option<u32> {
        self.entries.first().map(|e| e.distance_m)
    }

    pub fn max_distance(&self) -> Option<u32> {
        self.entries.last().map(|e| e.distance_m)
    }

    /// Row stored for exactly this distance
    pub fn get(&self, distance_m: u32) -> Option<&RangeEntry> {
        self.entries
            .binary_search_by_key(&distance_m, |e| e.distance_m)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Index of the first row whose distance is not below `distance_m`.
    pub(crate) fn lower_bound(&self, distance_m: u32) -> usize {
        self.entries.partition_point(|e| e.distance_m < distance_m)
    }
}
