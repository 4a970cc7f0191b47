/// Session limits and input bounds used by the fire-solution calculator

/// Maximum number of calculations kept in the session history.
///
/// Older entries are evicted first once a new calculation pushes the
/// count past this value.
pub const HISTORY_CAPACITY: usize = 20;

/// Maximum depth of the navigation back-stack.
///
/// Navigation is driven by a loop over explicit stages, so the stack only
/// needs to remember the recent path through the menus. The oldest stage is
/// dropped when the limit is reached.
pub const BACK_STACK_LIMIT: usize = 16;

/// Shortest distance accepted at the distance prompt (meters)
pub const MIN_TARGET_DISTANCE_M: i64 = 0;

/// Longest distance accepted at the distance prompt (meters)
pub const MAX_TARGET_DISTANCE_M: i64 = 10_000;

/// Lowest altitude accepted for the firing position or the target (meters)
pub const MIN_ALTITUDE_M: i64 = -1_000;

/// Highest altitude accepted for the firing position or the target (meters)
pub const MAX_ALTITUDE_M: i64 = 10_000;

/// Altitude used when the prompt is left empty
pub const DEFAULT_ALTITUDE_M: i64 = 0;

/// Azimuth correction used when the prompt is left empty.
///
/// The azimuth is an annotation only: it is stored and echoed verbatim.
pub const DEFAULT_AZIMUTH: &str = "0";

/// Tokens that request a step back from an input prompt (compared
/// case-insensitively after trimming).
pub const BACK_TOKENS: [&str; 4] = ["back", "b", "назад", "н"];

/// Elevation rate in the range tables is given per this many meters of
/// altitude difference.
pub const ELEVATION_RATE_BASE_M: f64 = 100.0;
