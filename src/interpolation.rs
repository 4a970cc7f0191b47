/// Bracket finding and linear interpolation over range tables
use crate::error::RangeError;
use crate::range_table::{RangeEntry, RangeTable};

/// Pair of table distances surrounding a target distance.
///
/// `low == high` means the target sits on the first row and that row is used
/// as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub low: u32,
    pub high: u32,
}

impl Bracket {
    pub fn is_degenerate(&self) -> bool {
        self.low == self.high
    }
}

/// Interpolated row values at a target distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolated {
    pub elevation_mils: f64,
    pub time_s: f64,
    pub elevation_rate: f64,
}

/// Find the table distances to interpolate between.
///
/// Uses the smallest key not below the target (leftmost bracket). An exact
/// match on an inner key yields `(previous, matched)`, which interpolates to
/// the matched row with a ratio of one.
pub fn bracket(table: &RangeTable, target_m: u32) -> Result<Bracket, RangeError> {
    let (min, max) = match (table.min_distance(), table.max_distance()) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(RangeError::Empty),
    };

    if target_m < min {
        return Err(RangeError::TooClose {
            min,
            deficit: min - target_m,
        });
    }
    if target_m > max {
        return Err(RangeError::TooFar {
            max,
            excess: target_m - max,
        });
    }

    let entries = table.entries();
    let idx = table.lower_bound(target_m);
    if idx == 0 {
        let first = entries[0].distance_m;
        return Ok(Bracket {
            low: first,
            high: first,
        });
    }

    Ok(Bracket {
        low: entries[idx - 1].distance_m,
        high: entries[idx].distance_m,
    })
}

/// Linear interpolation between two tabulated values.
///
/// Equal keys return `low_value` unchanged.
pub fn interpolate(low_key: u32, high_key: u32, target: u32, low_value: f64, high_value: f64) -> f64 {
    if low_key == high_key {
        return low_value;
    }
    let ratio = (f64::from(target) - f64::from(low_key)) / (f64::from(high_key) - f64::from(low_key));
    low_value + (high_value - low_value) * ratio
}

/// Bracket `target_m` and interpolate elevation, time and elevation rate.
pub fn interpolate_entry(table: &RangeTable, target_m: u32) -> Result<Interpolated, RangeError> {
    let b = bracket(table, target_m)?;
    let (low, high) = match (table.get(b.low), table.get(b.high)) {
        (Some(low), Some(high)) => (low, high),
        _ => return Err(RangeError::Empty),
    };
    Ok(interpolate_rows(b, target_m, low, high))
}

fn interpolate_rows(b: Bracket, target_m: u32, low: &RangeEntry, high: &RangeEntry) -> Interpolated {
    Interpolated {
        elevation_mils: interpolate(b.low, b.high, target_m, low.elevation_mils, high.elevation_mils),
        time_s: interpolate(b.low, b.high, target_m, low.time_s, high.time_s),
        elevation_rate: interpolate(b.low, b.high, target_m, low.elevation_rate, high.elevation_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_row_table() -> RangeTable {
        RangeTable::new(
            vec![(100, 10.0, 1.0, 5.0).into(), (200, 20.0, 2.0, 6.0).into()],
            10.0,
        )
    }

    fn descending_table() -> RangeTable {
        RangeTable::new(
            vec![
                (100, 1540.0, 20.0, 6.0).into(),
                (200, 1450.0, 19.8, 7.5).into(),
                (300, 1350.0, 19.5, 9.1).into(),
                (400, 1230.0, 19.1, 11.0).into(),
            ],
            13.0,
        )
    }

    #[test]
    fn test_midpoint_interpolation() {
        let t = two_row_table();
        assert_eq!(bracket(&t, 150), Ok(Bracket { low: 100, high: 200 }));

        let v = interpolate_entry(&t, 150).unwrap();
        assert!((v.elevation_mils - 15.0).abs() < 1e-9);
        assert!((v.time_s - 1.5).abs() < 1e-9);
        assert!((v.elevation_rate - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_too_close() {
        let t = two_row_table();
        assert_eq!(bracket(&t, 50), Err(RangeError::TooClose { min: 100, deficit: 50 }));
        assert_eq!(bracket(&t, 0), Err(RangeError::TooClose { min: 100, deficit: 100 }));
    }

    #[test]
    fn test_too_far() {
        let t = two_row_table();
        assert_eq!(bracket(&t, 250), Err(RangeError::TooFar { max: 200, excess: 50 }));
        assert_eq!(bracket(&t, 201), Err(RangeError::TooFar { max: 200, excess: 1 }));
    }

    #[test]
    fn test_empty_table() {
        let t = RangeTable::new(Vec::new(), 0.0);
        assert_eq!(bracket(&t, 100), Err(RangeError::Empty));
        assert_eq!(interpolate_entry(&t, 100), Err(RangeError::Empty));
    }

    #[test]
    fn test_first_key_is_degenerate_bracket() {
        let t = two_row_table();
        let b = bracket(&t, 100).unwrap();
        assert!(b.is_degenerate());
        assert_eq!(b, Bracket { low: 100, high: 100 });

        let v = interpolate_entry(&t, 100).unwrap();
        assert_eq!(v.elevation_mils, 10.0);
        assert_eq!(v.time_s, 1.0);
        assert_eq!(v.elevation_rate, 5.0);
    }

    #[test]
    fn test_exact_inner_match_uses_previous_key() {
        let t = descending_table();
        // Exact hit on an inner key brackets with the previous row and
        // reduces to the matched row with ratio = 1.
        assert_eq!(bracket(&t, 300), Ok(Bracket { low: 200, high: 300 }));
        let v = interpolate_entry(&t, 300).unwrap();
        assert!((v.elevation_mils - 1350.0).abs() < 1e-9);
        assert!((v.time_s - 19.5).abs() < 1e-9);
        assert!((v.elevation_rate - 9.1).abs() < 1e-9);

        // Last key too
        assert_eq!(bracket(&t, 400), Ok(Bracket { low: 300, high: 400 }));
        let last = interpolate_entry(&t, 400).unwrap();
        assert!((last.elevation_mils - 1230.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_keys_return_low_value() {
        for value in [-3.5, 0.0, 1.0, 1540.0] {
            assert_eq!(interpolate(250, 250, 250, value, 99.0), value);
            assert_eq!(interpolate(250, 250, 900, value, -99.0), value);
        }
    }

    #[test]
    fn test_interpolated_values_stay_between_rows() {
        let t = descending_table();
        for target in 101..400 {
            let b = bracket(&t, target).unwrap();
            let low = t.get(b.low).unwrap();
            let high = t.get(b.high).unwrap();
            let v = interpolate_entry(&t, target).unwrap();

            let (lo, hi) = if low.elevation_mils <= high.elevation_mils {
                (low.elevation_mils, high.elevation_mils)
            } else {
                (high.elevation_mils, low.elevation_mils)
            };
            assert!(
                v.elevation_mils >= lo - 1e-9 && v.elevation_mils <= hi + 1e-9,
                "elevation at {target} m outside [{lo}, {hi}]: {}",
                v.elevation_mils
            );
        }
    }

    #[test]
    fn test_deficit_and_excess_are_positive() {
        let t = descending_table();
        for target in 0..100 {
            match bracket(&t, target) {
                Err(RangeError::TooClose { deficit, .. }) => assert_eq!(deficit, 100 - target),
                other => panic!("expected TooClose for {target}, got {other:?}"),
            }
        }
        for target in 401..600 {
            match bracket(&t, target) {
                Err(RangeError::TooFar { excess, .. }) => assert_eq!(excess, target - 400),
                other => panic!("expected TooFar for {target}, got {other:?}"),
            }
        }
    }
}
