// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the vibration analyzer
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! - `device`: Settings for the serial link or the simulated sensor
//! - `analysis`: Sampling rate, collection window and peak reporting
//! - `output`: Optional JSON report destination
//!
//! ## Usage
//!
//! ```no_run
//! use witmotion_vibration::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("/dev/ttyUSB0".to_string()), // Serial device
//!     Some(115200),                     // Baud rate
//!     Some(50.0),                       // Sampling rate
//!     Some(30.0),                       // Duration
//!     None,                             // Peak count
//!     false,                            // Simulate
//!     false,                            // Plot
//!     None,                             // Report file
//! );
//!
//! println!("Sampling at {} Hz", config.analysis.sampling_rate);
//! ```

pub mod analysis;
pub mod device;
pub mod output;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use analysis::AnalysisConfig;
pub use device::{DeviceConfig, SimulationConfig};
pub use output::OutputConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// Root configuration structure of the vibration analyzer.
///
/// Every section falls back to its defaults when missing from the file, so
/// an empty YAML document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Sensor link settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Analysis run settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Result output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. A file that fails
    /// schema validation, deserialization or the additional rules leaves a
    /// `<name>.sample.yaml` with defaults next to it and returns an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // An empty document deserializes to YAML null
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;
        let yaml_value = if yaml_value.is_null() {
            serde_yml::Value::Mapping(serde_yml::Mapping::new())
        } else {
            yaml_value
        };

        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        let schema: serde_json::Value =
            serde_json::from_str(utils::CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_value(yaml_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Check the configuration against the additional validation rules
    pub fn validate(&self) -> Result<()> {
        validate_specific_rules(self)
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only explicitly provided values override the loaded configuration.
    /// `simulate` and `plot` can only switch their feature on.
    ///
    /// # Parameters
    ///
    /// * `serial_device` - Serial device node of the sensor
    /// * `baud_rate` - Serial line speed
    /// * `sampling_rate` - Sensor output rate in Hz
    /// * `duration` - Collection window in seconds
    /// * `peak_count` - Dominant frequencies reported per axis
    /// * `simulate` - Use the simulated sensor
    /// * `plot` - Render spectra after the analysis
    /// * `report_file` - Destination of the JSON report
    #[allow(clippy::too_many_arguments)]
    pub fn apply_args(
        &mut self,
        serial_device: Option<String>,
        baud_rate: Option<u32>,
        sampling_rate: Option<f64>,
        duration: Option<f64>,
        peak_count: Option<usize>,
        simulate: bool,
        plot: bool,
        report_file: Option<PathBuf>,
    ) {
        if let Some(device) = serial_device {
            debug!("Overriding serial device from command line: {}", device);
            self.device.serial_device = device;
        }
        if let Some(baud) = baud_rate {
            debug!("Overriding baud rate from command line: {}", baud);
            self.device.baud_rate = baud;
        }
        if simulate {
            debug!("Enabling simulated sensor from command line");
            self.device.simulated = true;
        }

        if let Some(rate) = sampling_rate {
            debug!("Overriding sampling rate from command line: {}", rate);
            self.analysis.sampling_rate = rate;
        }
        if let Some(seconds) = duration {
            debug!("Overriding duration from command line: {}", seconds);
            self.analysis.duration_seconds = seconds;
        }
        if let Some(count) = peak_count {
            debug!("Overriding peak count from command line: {}", count);
            self.analysis.peak_count = count;
        }
        if plot {
            debug!("Enabling plots from command line");
            self.analysis.plot = true;
        }

        if let Some(file) = report_file {
            debug!("Overriding report file from command line: {:?}", file);
            self.output.report_file = Some(file.to_string_lossy().to_string());
        }
    }
}
