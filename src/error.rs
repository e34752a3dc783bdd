//! Gameplay error types.
//!
//! Systems propagate errors through these types rather than panicking, then
//! log them at the system boundary and carry on with the frame.
//!
//! ## Usage
//!
//! ```rust
//! use brawlhouse::error::{GameError, GameResult};
//!
//! fn parse_scale(raw: &str) -> GameResult<f32> {
//!     raw.parse().map_err(|_| GameError::ConsoleParse {
//!         input: raw.to_string(),
//!         reason: "expected a number",
//!     })
//! }
//! # assert!(parse_scale("x").is_err());
//! ```

use std::fmt;

/// Top-level error enum for the gameplay layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// A data file (`assets/*.toml`) could not be parsed.
    ConfigParse {
        /// Path of the file being loaded.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A tuning value is outside its accepted range.
    InvalidValue {
        /// Name of the field (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },

    /// No enemy definition with this name exists in the catalog.
    UnknownEnemy(String),

    /// No upgrade definition with this name exists in the catalog.
    UnknownUpgrade(String),

    /// A non-stackable upgrade was granted a second time.
    UpgradeAlreadyOwned(String),

    /// A debug console line could not be parsed.
    ConsoleParse {
        input: String,
        reason: &'static str,
    },

    /// An entity was referenced but could not be found in the world.
    EntityNotFound {
        /// Where the lookup occurred.
        context: &'static str,
    },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::ConfigParse { path, message } => {
                write!(f, "failed to parse {}: {}", path, message)
            }
            GameError::InvalidValue {
                name,
                value,
                expected,
            } => write!(
                f,
                "value '{}' = {} is outside accepted range {}",
                name, value, expected
            ),
            GameError::UnknownEnemy(name) => write!(f, "unknown enemy '{}'", name),
            GameError::UnknownUpgrade(name) => write!(f, "unknown upgrade '{}'", name),
            GameError::UpgradeAlreadyOwned(name) => {
                write!(f, "upgrade '{}' is already owned and does not stack", name)
            }
            GameError::ConsoleParse { input, reason } => {
                write!(f, "cannot parse console command '{}': {}", input, reason)
            }
            GameError::EntityNotFound { context } => {
                write!(f, "entity not found during '{}'", context)
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `value` is finite and strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> GameResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GameError::InvalidValue {
            name,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` lies in the closed unit interval.
pub fn validate_unit_interval(name: &'static str, value: f32) -> GameResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GameError::InvalidValue {
            name,
            value,
            expected: "[0.0, 1.0]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_validation_rejects_zero_and_nan() {
        assert!(validate_positive("speed", 1.0).is_ok());
        assert!(validate_positive("speed", 0.0).is_err());
        assert!(validate_positive("speed", f32::NAN).is_err());
    }

    #[test]
    fn unit_interval_bounds_are_inclusive() {
        assert!(validate_unit_interval("variance", 0.0).is_ok());
        assert!(validate_unit_interval("variance", 1.0).is_ok());
        assert!(validate_unit_interval("variance", 1.01).is_err());
    }

    #[test]
    fn display_names_the_offending_enemy() {
        let err = GameError::UnknownEnemy("goblin".into());
        assert_eq!(err.to_string(), "unknown enemy 'goblin'");
    }

    #[test]
    fn display_is_readable_for_owned_upgrades_and_missing_entities() {
        assert_eq!(
            GameError::UpgradeAlreadyOwned("long_reach".into()).to_string(),
            "upgrade 'long_reach' is already owned and does not stack"
        );
        assert_eq!(
            GameError::EntityNotFound { context: "throw" }.to_string(),
            "entity not found during 'throw'"
        );
    }
}
