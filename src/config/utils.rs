// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::Config;

/// JSON schema embedded at compile time
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./witmotion_vibration --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against rules the JSON schema cannot express
/// or that must also hold for configurations built in code.
///
/// # Validation Rules
///
/// - **Sampling rate**: finite and strictly positive
/// - **Duration**: finite and strictly positive
/// - **Peak count**: at least one peak per axis
/// - **Serial link**: non-zero baud rate and a device path unless simulated
/// - **Simulation**: tone frequencies must be below the Nyquist frequency
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    let analysis = &config.analysis;
    if !analysis.sampling_rate.is_finite() || analysis.sampling_rate <= 0.0 {
        anyhow::bail!("Invalid sampling rate: {} Hz", analysis.sampling_rate);
    }
    if !analysis.duration_seconds.is_finite() || analysis.duration_seconds <= 0.0 {
        anyhow::bail!(
            "Invalid collection duration: {} s",
            analysis.duration_seconds
        );
    }
    if analysis.peak_count == 0 {
        anyhow::bail!("Peak count must be at least 1");
    }

    let device = &config.device;
    if device.baud_rate == 0 {
        anyhow::bail!("Invalid baud rate: {}", device.baud_rate);
    }
    if !device.simulated && device.serial_device.trim().is_empty() {
        anyhow::bail!("No serial device configured");
    }

    if device.simulated {
        // The simulator falls back to its default tones without a section
        let simulation = device.simulation.clone().unwrap_or_default();
        let nyquist = analysis.sampling_rate / 2.0;
        let tones = simulation
            .accel_frequencies
            .iter()
            .chain(simulation.gyro_frequencies.iter());
        for &frequency in tones {
            if !(0.0..nyquist).contains(&frequency) {
                anyhow::bail!(
                    "Simulated tone at {} Hz is outside [0, {}) Hz for a {} Hz sampling rate",
                    frequency,
                    nyquist,
                    analysis.sampling_rate
                );
            }
        }
    }

    Ok(())
}
