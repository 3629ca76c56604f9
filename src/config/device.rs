// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sensor link configuration
//!
//! This module defines how the application reaches the WitMotion sensor:
//! either a serial device (typically an `rfcomm` node bound to an HC-06
//! Bluetooth bridge) or a simulated sensor producing synthetic frames.

use serde::{Deserialize, Serialize};

/// Configuration of the sensor link.
///
/// # Example
///
/// ```
/// use witmotion_vibration::config::DeviceConfig;
///
/// let device = DeviceConfig {
///     serial_device: "/dev/ttyUSB0".to_string(),
///     baud_rate: 115200,
///     ..DeviceConfig::default()
/// };
/// assert!(!device.simulated);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Path of the serial device node.
    ///
    /// Default is `/dev/rfcomm0`, where an HC-06 module shows up on Linux.
    pub serial_device: String,

    /// Serial line speed in baud. WitMotion modules ship at 9600.
    pub baud_rate: u32,

    /// Timeout for a single blocking read in milliseconds.
    pub read_timeout_ms: u64,

    /// Pause after opening the port, letting the link stabilize.
    pub settle_time_ms: u64,

    /// Use the simulated sensor instead of the serial device.
    #[serde(default)]
    pub simulated: bool,

    /// Parameters of the simulated sensor.
    ///
    /// Defaults are used when `simulated` is set and this section is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationConfig>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial_device: "/dev/rfcomm0".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_time_ms: 1000,
            simulated: false,
            simulation: None,
        }
    }
}

/// Parameters of the simulated WitMotion sensor.
///
/// Each axis carries one sinusoidal vibration tone. Gravity is added to the
/// Z acceleration axis. Gaussian noise is added to every axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Tone frequency of the X, Y and Z acceleration axes in Hz
    pub accel_frequencies: [f64; 3],

    /// Peak amplitude of the acceleration tones in g
    pub accel_amplitude: f64,

    /// Tone frequency of the X, Y and Z gyroscope axes in Hz
    pub gyro_frequencies: [f64; 3],

    /// Peak amplitude of the gyroscope tones in deg/s
    pub gyro_amplitude: f64,

    /// Standard deviation of the noise, as a fraction of each tone amplitude
    pub noise_amplitude: f64,

    /// Constant offset on the Z acceleration axis in g
    pub gravity: f64,

    /// Corrupt the checksum of every n-th frame on the wire (0 disables)
    #[serde(default)]
    pub corrupt_every: u32,

    /// Random seed, making the simulation reproducible
    pub seed: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            accel_frequencies: [1.0, 2.0, 3.0],
            accel_amplitude: 0.5,
            gyro_frequencies: [0.5, 1.5, 2.5],
            gyro_amplitude: 20.0,
            noise_amplitude: 0.05,
            gravity: 1.0,
            corrupt_every: 0,
            seed: 12345,
        }
    }
}
