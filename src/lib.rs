// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! WitMotion vibration analysis library
//!
//! Collects acceleration and angular velocity readings from a WitMotion
//! inertial sensor over a fixed window, then finds the dominant vibration
//! frequencies of every axis with an FFT.
//!
//! - [`acquisition`]: sample sources, WitMotion frame decoding, recordings
//! - [`spectral`]: spectrum computation and dominant peak extraction
//! - [`analysis`]: the analysis run, its report and spectrum rendering
//! - [`config`]: YAML configuration with JSON schema validation

pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod error;
pub mod spectral;
pub mod utility;

pub use error::{Result, VibrationError};
