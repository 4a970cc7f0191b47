// Fire-solution computation across all charges of one ammunition type
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_AZIMUTH, ELEVATION_RATE_BASE_M};
use crate::error::RangeError;
use crate::interpolation::interpolate_entry;
use crate::profile::AmmunitionProfile;

/// Target data entered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireRequest {
    pub distance_m: u32,
    pub firer_altitude_m: i32,
    pub target_altitude_m: i32,
    /// Free-form azimuth correction, echoed verbatim
    pub azimuth: String,
}

impl FireRequest {
    pub fn new(distance_m: u32, firer_altitude_m: i32, target_altitude_m: i32) -> Self {
        Self {
            distance_m,
            firer_altitude_m,
            target_altitude_m,
            azimuth: DEFAULT_AZIMUTH.to_string(),
        }
    }

    pub fn with_azimuth(mut self, azimuth: impl Into<String>) -> Self {
        self.azimuth = azimuth.into();
        self
    }

    /// Firer altitude minus target altitude (meters)
    pub fn altitude_difference_m(&self) -> i32 {
        self.firer_altitude_m - self.target_altitude_m
    }

    pub fn has_azimuth(&self) -> bool {
        self.azimuth != DEFAULT_AZIMUTH
    }
}

/// Solution for one charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResult {
    pub charge: u32,
    /// Interpolated elevation including altitude compensation
    pub elevation_mils: f64,
    pub time_s: f64,
    pub dispersion_m: f64,
    pub altitude_comp_mils: f64,
}

/// Charge that could not serve the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub charge: u32,
    pub reason: String,
}

impl VariantFailure {
    fn new(charge: u32, err: &RangeError) -> Self {
        Self {
            charge,
            reason: err.to_string(),
        }
    }

    /// Message shown to the user, prefixed with the charge
    pub fn message(&self) -> String {
        format!("charge {}: {}", self.charge, self.reason)
    }
}

/// Results for every charge of an ammunition type.
///
/// Zero results is a valid outcome: every charge failed and `failures`
/// explains why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationOutcome {
    pub results: Vec<VariantResult>,
    pub failures: Vec<VariantFailure>,
}

impl CalculationOutcome {
    pub fn all_failed(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failure_messages(&self) -> Vec<String> {
        self.failures.iter().map(VariantFailure::message).collect()
    }
}

/// Elevation correction for the height difference between firer and target.
///
/// Firer above target with a positive rate adds elevation.
pub fn altitude_compensation(firer_altitude_m: i32, target_altitude_m: i32, elevation_rate: f64) -> f64 {
    f64::from(firer_altitude_m - target_altitude_m) * (elevation_rate / ELEVATION_RATE_BASE_M)
}

/// Compute a solution for every charge of `ammunition`.
///
/// Charges are processed independently; a range failure on one charge is
/// recorded and the rest are still computed. Results come back in
/// ascending charge order.
pub fn compute(ammunition: &AmmunitionProfile, request: &FireRequest) -> CalculationOutcome {
    let mut outcome = CalculationOutcome::default();

    for (&charge, table) in &ammunition.charges {
        let values = match interpolate_entry(table, request.distance_m) {
            Ok(values) => values,
            Err(err) => {
                debug!("charge {charge} of {}: {err}", ammunition.name);
                outcome.failures.push(VariantFailure::new(charge, &err));
                continue;
            }
        };

        let altitude_comp_mils = altitude_compensation(
            request.firer_altitude_m,
            request.target_altitude_m,
            values.elevation_rate,
        );

        outcome.results.push(VariantResult {
            charge,
            elevation_mils: values.elevation_mils + altitude_comp_mils,
            time_s: values.time_s,
            dispersion_m: table.dispersion_m(),
            altitude_comp_mils,
        });
    }

    outcome.results.sort_by_key(|r| r.charge);
    debug!(
        "{}: {} solutions, {} failures at {} m",
        ammunition.name,
        outcome.results.len(),
        outcome.failures.len(),
        request.distance_m
    );
    outcome
}
