// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated WitMotion sensor
//!
//! Produces the byte stream a real sensor would send: one acceleration and
//! one angular velocity frame per sample period, each axis carrying a noisy
//! sinusoidal tone. The stream goes through the same [`FrameCollector`] as
//! serial data, so decoding and frame dropping behave identically.
//! Collection does not sleep; a 120 s window is produced instantly.

use std::time::Duration;

use log::{debug, info};

use super::witmotion::Frame;
use super::{CollectedData, FrameCollector, SampleSource};
use crate::config::SimulationConfig;
use crate::error::{Result, VibrationError};
use crate::utility::NoiseGenerator;

/// Chip temperature reported in simulated acceleration frames
const SIMULATED_TEMPERATURE: f64 = 25.0;

pub struct SimulatedDevice {
    config: SimulationConfig,
    sampling_rate: f64,
    connected: bool,
}

impl SimulatedDevice {
    pub fn new(config: SimulationConfig, sampling_rate: f64) -> Self {
        Self {
            config,
            sampling_rate,
            connected: false,
        }
    }

    fn corrupt(&self, frame_index: u64, bytes: &mut [u8]) {
        let every = self.config.corrupt_every as u64;
        if every > 0 && frame_index % every == 0 {
            if let Some(last) = bytes.last_mut() {
                *last ^= 0xff;
            }
        }
    }
}

impl SampleSource for SimulatedDevice {
    fn name(&self) -> &str {
        "simulated"
    }

    fn connect(&mut self) -> bool {
        debug!("Simulated sensor connected");
        self.connected = true;
        true
    }

    fn collect_data(&mut self, duration: Duration) -> Result<CollectedData> {
        if !self.connected {
            return Err(VibrationError::NotConnected {
                device: self.name().to_string(),
            });
        }
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(VibrationError::invalid_input(format!(
                "invalid sampling rate: {} Hz",
                self.sampling_rate
            )));
        }

        let sample_count = (duration.as_secs_f64() * self.sampling_rate).floor() as usize;
        info!(
            "Simulating {} samples at {} Hz",
            sample_count, self.sampling_rate
        );

        let cfg = &self.config;
        let accel_noise = cfg.noise_amplitude * cfg.accel_amplitude;
        let gyro_noise = cfg.noise_amplitude * cfg.gyro_amplitude;
        let mut generator = NoiseGenerator::new(cfg.seed);
        let mut collector = FrameCollector::new();
        let mut frame_index: u64 = 0;

        for i in 0..sample_count {
            let t = i as f64 / self.sampling_rate;

            let mut accel = [0.0; 3];
            for (axis, value) in accel.iter_mut().enumerate() {
                let offset = if axis == 2 { cfg.gravity } else { 0.0 };
                *value = generator.tone_sample(
                    t,
                    cfg.accel_frequencies[axis],
                    cfg.accel_amplitude,
                    offset,
                    accel_noise,
                );
            }
            let mut gyro = [0.0; 3];
            for (axis, value) in gyro.iter_mut().enumerate() {
                *value = generator.tone_sample(
                    t,
                    cfg.gyro_frequencies[axis],
                    cfg.gyro_amplitude,
                    0.0,
                    gyro_noise,
                );
            }

            let frames = [
                Frame::Acceleration {
                    x: accel[0],
                    y: accel[1],
                    z: accel[2],
                    temperature: SIMULATED_TEMPERATURE,
                },
                Frame::AngularVelocity {
                    x: gyro[0],
                    y: gyro[1],
                    z: gyro[2],
                },
            ];
            for frame in frames {
                frame_index += 1;
                let mut bytes = frame.encode();
                self.corrupt(frame_index, &mut bytes);
                collector.feed(&bytes, t);
            }
        }

        Ok(collector.finish())
    }

    fn disconnect(&mut self) {
        if self.connected {
            debug!("Simulated sensor disconnected");
        }
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
