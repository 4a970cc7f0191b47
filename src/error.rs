// Error types for range lookup, user input, data loading and the session loop
use thiserror::Error;

/// Requested distance cannot be served by one charge's range table.
///
/// This is expected during normal use: low charges cannot reach far
/// targets and high charges have a minimum range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("distance too short, minimum is {min} m ({deficit} m short)")]
    TooClose { min: u32, deficit: u32 },

    #[error("distance too long, maximum is {max} m ({excess} m over)")]
    TooFar { max: u32, excess: u32 },

    #[error("no range data for this charge")]
    Empty,
}

/// Malformed or out-of-bounds input typed by the user.
///
/// Always recovered by asking again; never leaves the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("please enter a whole number")]
    NotANumber,

    #[error("value must be at least {min}")]
    BelowMinimum { min: i64 },

    #[error("value must be at most {max}")]
    AboveMaximum { max: i64 },

    #[error("no history entry #{index} (history holds {len})")]
    HistoryIndex { index: usize, len: usize },
}

/// Failure to load or resolve range data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("failed to parse range data: {0}")]
    Parse(String),

    #[error("failed to read range data: {0}")]
    Io(String),

    #[error("unknown weapon '{0}'")]
    UnknownWeapon(String),

    #[error("unknown ammunition '{ammunition}' for weapon '{weapon}'")]
    UnknownAmmunition { weapon: String, ammunition: String },
}

/// Errors raised while running the interactive session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Ctrl-C at a prompt
    #[error("interrupted")]
    Interrupted,

    /// Input stream closed (Ctrl-D or end of piped input)
    #[error("end of input")]
    EndOfInput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Whether the session loop should stop rather than recover.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            SessionError::Interrupted | SessionError::EndOfInput | SessionError::Io(_)
        )
    }
}
