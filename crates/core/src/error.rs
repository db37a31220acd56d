//! Error type shared by every fallible operation in the core.
//!
//! Only parameter-domain problems are reported here. Hot-path values (intensities,
//! grid indices) are clamped silently and never produce an error.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FireError>;

/// Errors returned at the API boundary when a caller passes out-of-domain parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FireError {
    /// Grid dimensions out of range (zero-sized axis, source-only height, or overflowing cell count).
    InvalidDimensions {
        width: usize,
        height: usize,
        depth: usize,
    },
    /// Brush radius outside the accepted range for the operation.
    InvalidRadius(u32),
    /// Brush multiplier must be finite.
    InvalidMultiplier(f32),
    /// Rectangle or box with `min > max` on some axis.
    InvalidRect { min: (i32, i32), max: (i32, i32) },
    /// Camera parameters that cannot produce a view basis.
    InvalidCamera(String),
    /// Tuning parameters out of range (spread multipliers, tracer settings).
    InvalidSettings(String),
    /// Palette table with the wrong number of entries.
    PaletteSize(usize),
    /// Caller-provided buffer does not match the output size.
    BufferSize { expected: usize, actual: usize },
}

impl fmt::Display for FireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireError::InvalidDimensions {
                width,
                height,
                depth,
            } => write!(f, "invalid grid dimensions {width}x{height}x{depth}"),
            FireError::InvalidRadius(radius) => write!(f, "invalid brush radius {radius}"),
            FireError::InvalidMultiplier(m) => {
                write!(f, "brush multiplier must be finite, got {m}")
            }
            FireError::InvalidRect { min, max } => write!(
                f,
                "rectangle min ({}, {}) exceeds max ({}, {})",
                min.0, min.1, max.0, max.1
            ),
            FireError::InvalidCamera(msg) => write!(f, "invalid camera: {msg}"),
            FireError::InvalidSettings(msg) => write!(f, "invalid settings: {msg}"),
            FireError::PaletteSize(len) => {
                write!(f, "palette must have 256 entries, got {len}")
            }
            FireError::BufferSize { expected, actual } => {
                write!(f, "buffer holds {actual} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for FireError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FireError::InvalidRadius(0);
        assert_eq!(err.to_string(), "invalid brush radius 0");

        let err = FireError::InvalidRect {
            min: (5, 0),
            max: (1, 3),
        };
        assert_eq!(err.to_string(), "rectangle min (5, 0) exceeds max (1, 3)");

        let err = FireError::PaletteSize(12);
        assert!(err.to_string().contains("12"));
    }
}
