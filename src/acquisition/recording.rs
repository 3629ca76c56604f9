// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Multi-axis sensor recordings
//!
//! A [`MultiAxisRecording`] stores the X, Y and Z components of one sensor
//! (accelerometer or gyroscope) against a single timestamp sequence.
//! Recordings are plain in-memory vectors, created per run and dropped
//! afterwards.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::error::{Result, VibrationError};

/// One Cartesian component of a sensor vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in display order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Physical quantity measured by a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Linear acceleration in g
    Acceleration,
    /// Angular velocity in degrees per second
    AngularVelocity,
}

impl SensorKind {
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Acceleration => "acceleration",
            SensorKind::AngularVelocity => "gyroscope",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Acceleration => "g",
            SensorKind::AngularVelocity => "deg/s",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Three axis readings of one sensor sharing a timestamp sequence
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAxisRecording {
    kind: SensorKind,
    timestamps: Vec<f64>,
    axes: [Vec<f64>; 3],
}

impl MultiAxisRecording {
    /// Create an empty recording
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            timestamps: Vec::new(),
            axes: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Build a recording from timestamps and `(x, y, z)` readings
    ///
    /// ### Errors
    ///
    /// Returns [`VibrationError::InvalidInput`] when the two sequences do
    /// not have the same length.
    pub fn from_vectors(kind: SensorKind, timestamps: Vec<f64>, readings: &[[f64; 3]]) -> Result<Self> {
        if timestamps.len() != readings.len() {
            return Err(VibrationError::invalid_input(format!(
                "{} timestamps for {} {} readings",
                timestamps.len(),
                readings.len(),
                kind
            )));
        }

        let mut recording = Self::new(kind);
        recording.timestamps = timestamps;
        for axis in Axis::ALL {
            recording.axes[axis.index()] = readings.iter().map(|r| r[axis.index()]).collect();
        }
        Ok(recording)
    }

    /// Append one reading taken at `timestamp` seconds
    pub fn push(&mut self, timestamp: f64, reading: [f64; 3]) {
        self.timestamps.push(timestamp);
        for axis in Axis::ALL {
            self.axes[axis.index()].push(reading[axis.index()]);
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Scalar values of one axis over time
    pub fn axis(&self, axis: Axis) -> &[f64] {
        &self.axes[axis.index()]
    }

    /// Reading number `index` as `[x, y, z]`
    pub fn reading(&self, index: usize) -> Option<[f64; 3]> {
        if index >= self.len() {
            return None;
        }
        Some([
            self.axes[0][index],
            self.axes[1][index],
            self.axes[2][index],
        ])
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Keep the first `len` readings and discard the rest
    pub fn truncate(&mut self, len: usize) {
        self.timestamps.truncate(len);
        for values in &mut self.axes {
            values.truncate(len);
        }
    }

    /// Mean interval between readings, if at least two are present
    pub fn mean_interval(&self) -> Option<f64> {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) if self.len() > 1 => {
                Some((last - first) / (self.len() - 1) as f64)
            }
            _ => None,
        }
    }
}

/// Truncate two recordings to their common length
///
/// Both recordings keep their first `min(len(accel), len(gyro))` readings.
/// Nothing is resampled or interpolated and timestamps are not matched.
///
/// ### Errors
///
/// Returns [`VibrationError::InsufficientData`] when the common length is
/// zero.
pub fn align_recordings(
    mut accel: MultiAxisRecording,
    mut gyro: MultiAxisRecording,
) -> Result<(MultiAxisRecording, MultiAxisRecording)> {
    let common = accel.len().min(gyro.len());
    if common == 0 {
        return Err(VibrationError::insufficient_data(format!(
            "cannot align {} acceleration readings with {} gyroscope readings",
            accel.len(),
            gyro.len()
        )));
    }

    if accel.len() != gyro.len() {
        debug!(
            "Aligning recordings: {} acceleration / {} gyroscope readings -> {}",
            accel.len(),
            gyro.len(),
            common
        );
    }
    accel.truncate(common);
    gyro.truncate(common);
    Ok((accel, gyro))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(kind: SensorKind, len: usize) -> MultiAxisRecording {
        let timestamps: Vec<f64> = (0..len).map(|i| i as f64 * 0.1).collect();
        let readings: Vec<[f64; 3]> = (0..len)
            .map(|i| [i as f64, i as f64 * 2.0, i as f64 * 3.0])
            .collect();
        MultiAxisRecording::from_vectors(kind, timestamps, &readings).unwrap()
    }

    #[test]
    fn test_from_vectors_splits_axes() {
        let rec = recording(SensorKind::Acceleration, 4);
        assert_eq!(rec.len(), 4);
        assert_eq!(rec.axis(Axis::X), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(rec.axis(Axis::Y), &[0.0, 2.0, 4.0, 6.0]);
        assert_eq!(rec.axis(Axis::Z), &[0.0, 3.0, 6.0, 9.0]);
        assert_eq!(rec.reading(2), Some([2.0, 4.0, 6.0]));
        assert_eq!(rec.reading(4), None);
    }

    #[test]
    fn test_from_vectors_rejects_length_mismatch() {
        let result = MultiAxisRecording::from_vectors(
            SensorKind::AngularVelocity,
            vec![0.0, 0.1],
            &[[1.0, 2.0, 3.0]],
        );
        assert!(matches!(result, Err(VibrationError::InvalidInput { .. })));
    }

    #[test]
    fn test_align_truncates_from_the_start() {
        let (accel, gyro) = align_recordings(
            recording(SensorKind::Acceleration, 100),
            recording(SensorKind::AngularVelocity, 80),
        )
        .unwrap();
        assert_eq!(accel.len(), 80);
        assert_eq!(gyro.len(), 80);
        assert_eq!(accel.axis(Axis::X)[0], 0.0);
        assert_eq!(accel.axis(Axis::X)[79], 79.0);
        assert_eq!(accel.timestamps().len(), 80);
    }

    #[test]
    fn test_align_equal_lengths_is_identity() {
        let accel = recording(SensorKind::Acceleration, 10);
        let gyro = recording(SensorKind::AngularVelocity, 10);
        let (a, g) = align_recordings(accel.clone(), gyro.clone()).unwrap();
        assert_eq!(a, accel);
        assert_eq!(g, gyro);
    }

    #[test]
    fn test_align_empty_recording_fails() {
        let result = align_recordings(
            recording(SensorKind::Acceleration, 5),
            MultiAxisRecording::new(SensorKind::AngularVelocity),
        );
        assert!(matches!(result, Err(VibrationError::InsufficientData { .. })));
    }

    #[test]
    fn test_mean_interval() {
        let rec = recording(SensorKind::Acceleration, 11);
        assert!((rec.mean_interval().unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(MultiAxisRecording::new(SensorKind::Acceleration).mean_interval(), None);
    }
}
