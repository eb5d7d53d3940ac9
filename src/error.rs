//! Error type for rotation configuration.

use thiserror::Error;

/// Errors raised while building a rotation.
///
/// Construction is the only fallible step. Once a rotation exists, every
/// control operation is total and reports whether anything changed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No texts to rotate through, so no valid index exists.
    #[error("rotation needs at least one text")]
    EmptyTexts,
    /// Per-unit stagger delay is negative or not finite.
    #[error("invalid stagger duration: {0}")]
    InvalidStagger(f64),
    /// Fixed display height is non-positive or not finite.
    #[error("invalid fixed height: {0}")]
    InvalidHeight(f64),
    /// Spring parameters cannot settle.
    #[error("invalid spring: stiffness and mass must be positive, damping non-negative")]
    InvalidSpring,
    /// Config file could not be parsed.
    #[cfg(feature = "toml")]
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}
