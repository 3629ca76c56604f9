// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error kinds shared by the acquisition, spectral and analysis layers

use thiserror::Error;

/// Errors raised while acquiring or analyzing vibration data
#[derive(Error, Debug)]
pub enum VibrationError {
    /// The link to the sensor could not be established
    #[error("Failed to connect to device {device}: {reason}")]
    ConnectionFailure { device: String, reason: String },

    /// An operation that needs an open link was called without one
    #[error("Device {device} is not connected")]
    NotConnected { device: String },

    /// Empty or malformed time series handed to the spectral analyzer
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Collection or alignment left nothing to analyze
    #[error("Insufficient data: {reason}")]
    InsufficientData { reason: String },

    /// A single sensor frame could not be decoded
    #[error("Frame decode error: {reason}")]
    FrameDecode { reason: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl VibrationError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        VibrationError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        VibrationError::InsufficientData {
            reason: reason.into(),
        }
    }

    pub fn frame_decode(reason: impl Into<String>) -> Self {
        VibrationError::FrameDecode {
            reason: reason.into(),
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, VibrationError>;
