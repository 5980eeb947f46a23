//! Error types for tank locomotion setup and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or initializing a tread system.
///
/// Per-tick simulation never fails: degenerate numeric cases (no grounded
/// wheels, empty structures) are guarded inside the solvers instead.
#[derive(Debug, Error)]
pub enum TreadError {
    /// The wheel list is empty.
    #[error("tank has no wheels; at least one wheel is required")]
    NoWheels,

    /// Every wheel was marked as an extra (non-traction) wheel.
    #[error("{extra} extra wheels leave no traction wheels out of {wheels}")]
    TooManyExtraWheels { extra: usize, wheels: usize },

    /// A single wheel has unusable geometry or tuning.
    #[error("wheel {index}: {reason}")]
    InvalidWheel { index: usize, reason: String },

    /// Curve control points are empty, non-finite or unsorted.
    #[error("invalid response curve: {0}")]
    InvalidCurve(String),

    /// Any other out-of-range tuning value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Terrain profiles need at least one segment.
    #[error("terrain profile needs at least two points, got {0}")]
    TerrainTooShort(usize),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type TreadResult<T> = std::result::Result<T, TreadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_problem() {
        let err = TreadError::TooManyExtraWheels { extra: 4, wheels: 4 };
        assert_eq!(err.to_string(), "4 extra wheels leave no traction wheels out of 4");

        let err = TreadError::InvalidWheel { index: 2, reason: "radius must be > 0".into() };
        assert!(err.to_string().starts_with("wheel 2:"));
    }
}
