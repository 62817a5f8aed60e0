//! Error types for configuration loading and validation.
//!
//! The simulation itself never fails at runtime; degenerate inputs turn
//! into no-ops. Errors only arise when a configuration is rejected.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A quantity that must be strictly positive was not.
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    /// A quantity that must be non-negative was negative or NaN.
    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// A quantity that may take any sign was NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    /// A `min..max` pair was given in the wrong order.
    #[error("{field}: min ({min}) must not exceed max ({max})")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    /// A count that must be at least one was zero.
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },

    /// The fade live limit is above the hard node ceiling.
    #[error("live_limit ({live_limit}) must not exceed max_nodes ({max_nodes})")]
    LiveLimitAboveCeiling { live_limit: usize, max_nodes: usize },

    /// The synchronizer was asked to pack more nodes than its block holds.
    #[error("field max_nodes ({requested}) exceeds the fixed capacity of {capacity}")]
    FieldCapacity { requested: usize, capacity: usize },

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`crate::config::SimConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn check_positive(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::NotPositive { field, value })
        }
    }

    pub(crate) fn check_non_negative(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::Negative { field, value })
        }
    }

    pub(crate) fn check_finite(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self::NotFinite { field, value })
        }
    }

    pub(crate) fn check_range(field: &'static str, min: f32, max: f32) -> Result<(), Self> {
        if min <= max {
            Ok(())
        } else {
            Err(Self::InvertedRange { field, min, max })
        }
    }
}
