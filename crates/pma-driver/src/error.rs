//! Error types for pattern-matcher operations
//!
//! Register sequences themselves never fail; these errors come from the
//! edges: mapping a device, decoding knowledge images, checked variants of
//! the streaming calls and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pattern-matcher operations
pub type Result<T> = std::result::Result<T, PmaError>;

/// Errors that can occur around the register protocol
#[derive(Debug, Error)]
pub enum PmaError {
    /// I/O error while opening a device or image file
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Device node missing
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Register window could not be mapped
    #[error("Failed to map register window: {reason}")]
    MapFailed {
        /// Reason for failure
        reason: String,
    },

    /// Pattern vector longer than the comparator accepts
    #[error("Vector of {length} bytes exceeds the {max}-byte comparator")]
    VectorTooLong {
        /// Length supplied
        length: usize,
        /// Maximum accepted
        max: usize,
    },

    /// Pattern vector with no components
    #[error("Pattern vector is empty")]
    EmptyVector,

    /// More neurons replayed than the array holds
    #[error("Neuron chain full ({max} neurons)")]
    ChainFull {
        /// Capacity of the array
        max: usize,
    },

    /// Knowledge image could not be decoded
    #[error("Invalid knowledge image: {reason}")]
    InvalidImage {
        /// Reason for failure
        reason: String,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for failure
        reason: String,
    },
}

impl PmaError {
    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create a map failed error
    pub fn map_failed(reason: impl Into<String>) -> Self {
        Self::MapFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid image error
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
