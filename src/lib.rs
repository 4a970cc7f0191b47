//! # Mortar Calculator
//!
//! Indirect-fire solutions (elevation, time of flight, altitude correction)
//! from tabulated range data, with an interactive menu-driven session.

// Re-export the main types and functions
pub use calculation::{
    altitude_compensation, compute, CalculationOutcome, FireRequest, VariantFailure, VariantResult,
};
pub use error::{DataError, InputError, RangeError, SessionError};
pub use history::{HistoryEntry, HistoryStore};
pub use interpolation::{bracket, interpolate, Bracket};
pub use profile::{AmmunitionProfile, Database, Faction, WeaponProfile};
pub use range_table::{RangeEntry, RangeTable};
pub use session::{Session, Stage};

// Module declarations
pub mod calculation;
pub mod constants;
pub mod error;
pub mod history;
pub mod input;
pub mod interpolation;
pub mod profile;
mod range_table;
pub mod render;
pub mod session;
