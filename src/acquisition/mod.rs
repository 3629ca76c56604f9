// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sensor data acquisition module
//!
//! This module handles the acquisition of acceleration and angular velocity
//! readings from a WitMotion inertial sensor, either over a serial link or
//! from a simulated sensor.
//!
//! Collection is synchronous: [`SampleSource::collect_data`] blocks the
//! calling thread for the whole collection window. The link is a scoped
//! resource; [`ConnectionGuard`] releases it on every exit path.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use log::{debug, info};

pub mod recording;
mod serial;
mod simulated;
pub mod witmotion;

pub use recording::{align_recordings, Axis, MultiAxisRecording, SensorKind};
pub use serial::{available_devices, WitmotionDevice};
pub use simulated::SimulatedDevice;
pub use witmotion::{Frame, FrameDecoder};

use crate::config::DeviceConfig;
use crate::error::{Result, VibrationError};

/// A device that yields timestamped 3-axis acceleration and angular
/// velocity readings
pub trait SampleSource: Send {
    /// Human-readable name of the device, used in diagnostics
    fn name(&self) -> &str;

    /// Establish the link to the hardware
    ///
    /// Expected failures (device absent, port busy) are reported by
    /// returning `false`, never by panicking.
    fn connect(&mut self) -> bool;

    /// Collect readings for up to `duration`
    ///
    /// Malformed frames are skipped. Whatever was accumulated is returned,
    /// even if collection stopped early.
    fn collect_data(&mut self, duration: Duration) -> Result<CollectedData>;

    /// Release the link. Safe to call when not connected.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Reason of the last failed `connect()`, if known
    fn last_error(&self) -> Option<&str> {
        None
    }
}

/// Readings accumulated during one collection window
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedData {
    pub acceleration: MultiAxisRecording,
    pub gyroscope: MultiAxisRecording,
    /// Frames dropped because they failed validation
    pub dropped_frames: usize,
}

impl CollectedData {
    pub fn new() -> Self {
        Self {
            acceleration: MultiAxisRecording::new(SensorKind::Acceleration),
            gyroscope: MultiAxisRecording::new(SensorKind::AngularVelocity),
            dropped_frames: 0,
        }
    }

    /// Timestamps of the acceleration readings, in seconds from the start
    pub fn timestamps(&self) -> &[f64] {
        self.acceleration.timestamps()
    }

    /// True when either sensor produced no reading at all
    pub fn is_empty(&self) -> bool {
        self.acceleration.is_empty() || self.gyroscope.is_empty()
    }
}

impl Default for CollectedData {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns the raw byte stream of a link into sensor recordings
#[derive(Debug, Default)]
pub struct FrameCollector {
    decoder: FrameDecoder,
    data: CollectedData,
}

impl FrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and stamp every reading they complete with `timestamp`
    pub fn feed(&mut self, bytes: &[u8], timestamp: f64) {
        self.feed_spanning(bytes, timestamp, timestamp);
    }

    /// Decode a chunk that arrived over `(start, end]` seconds
    ///
    /// The frames completed by the chunk are spread evenly over the span, the
    /// last one landing on `end`, so that readings of one chunk keep distinct
    /// and increasing timestamps.
    pub fn feed_spanning(&mut self, bytes: &[u8], start: f64, end: f64) {
        let frames = self.decoder.push(bytes);
        let count = frames.len();
        for (index, frame) in frames.into_iter().enumerate() {
            let timestamp = start + (end - start) * (index + 1) as f64 / count as f64;
            match frame {
                Frame::Acceleration { x, y, z, .. } => {
                    self.data.acceleration.push(timestamp, [x, y, z]);
                }
                Frame::AngularVelocity { x, y, z } => {
                    self.data.gyroscope.push(timestamp, [x, y, z]);
                }
                other => debug!("Ignoring frame type 0x{:02x}", other.kind()),
            }
        }
    }

    pub fn finish(mut self) -> CollectedData {
        self.data.dropped_frames = self.decoder.dropped_frames();
        info!(
            "Collected {} acceleration and {} gyroscope readings ({} frames dropped)",
            self.data.acceleration.len(),
            self.data.gyroscope.len(),
            self.data.dropped_frames
        );
        self.data
    }
}

/// Connected sample source, disconnected when dropped
pub struct ConnectionGuard<'a> {
    source: &'a mut dyn SampleSource,
}

impl<'a> ConnectionGuard<'a> {
    /// Connect `source`, or report why it could not be connected
    pub fn connect(source: &'a mut dyn SampleSource) -> Result<Self> {
        if !source.connect() {
            return Err(VibrationError::ConnectionFailure {
                device: source.name().to_string(),
                reason: source
                    .last_error()
                    .unwrap_or("device did not respond")
                    .to_string(),
            });
        }
        Ok(Self { source })
    }
}

impl<'a> Deref for ConnectionGuard<'a> {
    type Target = dyn SampleSource + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.source
    }
}

impl<'a> DerefMut for ConnectionGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.source
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.source.disconnect();
    }
}

/// Convert a duration in seconds into a [`Duration`]
pub fn collection_window(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        VibrationError::invalid_input(format!("invalid collection duration: {} s", seconds))
    })
}

/// Get the sample source described by the device configuration
pub fn create_sample_source(config: &DeviceConfig, sampling_rate: f64) -> Box<dyn SampleSource> {
    if config.simulated {
        info!("Using simulated WitMotion sensor");
        Box::new(SimulatedDevice::new(
            config.simulation.clone().unwrap_or_default(),
            sampling_rate,
        ))
    } else {
        info!("Using WitMotion sensor on {}", config.serial_device);
        Box::new(WitmotionDevice::new(config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::witmotion::{encode_raw, kind};

    struct CountingSource {
        accept: bool,
        connects: usize,
        disconnects: usize,
    }

    impl SampleSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }
        fn connect(&mut self) -> bool {
            self.connects += 1;
            self.accept
        }
        fn collect_data(&mut self, _duration: Duration) -> Result<CollectedData> {
            Err(VibrationError::insufficient_data("nothing here"))
        }
        fn disconnect(&mut self) {
            self.disconnects += 1;
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn last_error(&self) -> Option<&str> {
            Some("port busy")
        }
    }

    #[test]
    fn test_guard_disconnects_on_error_path() {
        let mut source = CountingSource {
            accept: true,
            connects: 0,
            disconnects: 0,
        };
        {
            let mut guard = ConnectionGuard::connect(&mut source).unwrap();
            assert!(guard.collect_data(Duration::from_secs(1)).is_err());
        }
        assert_eq!(source.connects, 1);
        assert_eq!(source.disconnects, 1);
    }

    #[test]
    fn test_guard_reports_connection_failure() {
        let mut source = CountingSource {
            accept: false,
            connects: 0,
            disconnects: 0,
        };
        match ConnectionGuard::connect(&mut source) {
            Err(VibrationError::ConnectionFailure { device, reason }) => {
                assert_eq!(device, "counting");
                assert_eq!(reason, "port busy");
            }
            _ => panic!("expected a connection failure"),
        }
        assert_eq!(source.disconnects, 0);
    }

    #[test]
    fn test_collector_routes_frames_by_type() {
        let mut collector = FrameCollector::new();
        collector.feed(&encode_raw(kind::ACCELERATION, [2048, 0, 0, 0]), 0.0);
        collector.feed(&encode_raw(kind::ANGULAR_VELOCITY, [0, 16384, 0, 0]), 0.1);
        collector.feed(&encode_raw(kind::ANGLE, [1, 2, 3, 0]), 0.2);
        let data = collector.finish();

        assert_eq!(data.acceleration.len(), 1);
        assert_eq!(data.gyroscope.len(), 1);
        assert_eq!(data.acceleration.reading(0), Some([1.0, 0.0, 0.0]));
        assert_eq!(data.gyroscope.reading(0), Some([0.0, 1000.0, 0.0]));
        assert_eq!(data.gyroscope.timestamps(), &[0.1]);
        assert_eq!(data.timestamps(), &[0.0]);
    }

    #[test]
    fn test_chunk_frames_spread_over_arrival_span() {
        let mut chunk = Vec::new();
        for i in 0..2 {
            chunk.extend_from_slice(&encode_raw(kind::ACCELERATION, [i, 0, 0, 0]));
            chunk.extend_from_slice(&encode_raw(kind::ANGULAR_VELOCITY, [i, 0, 0, 0]));
        }
        let mut collector = FrameCollector::new();
        collector.feed_spanning(&chunk, 1.0, 1.4);
        let data = collector.finish();

        let accel = data.acceleration.timestamps();
        let gyro = data.gyroscope.timestamps();
        assert_eq!(accel.len(), 2);
        assert_eq!(gyro.len(), 2);
        approx::assert_relative_eq!(accel[0], 1.1, epsilon = 1e-12);
        approx::assert_relative_eq!(gyro[0], 1.2, epsilon = 1e-12);
        approx::assert_relative_eq!(accel[1], 1.3, epsilon = 1e-12);
        approx::assert_relative_eq!(gyro[1], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_collection_window_rejects_negative_duration() {
        assert!(collection_window(-1.0).is_err());
        assert_eq!(collection_window(1.5).unwrap(), Duration::from_millis(1500));
    }
}
