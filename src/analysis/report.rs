// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Analysis report
//!
//! The outcome of one analysis run: the dominant frequencies of every axis
//! of both sensors, or the reason an axis could not be analyzed. A report
//! prints as the console listing and serializes to JSON.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::acquisition::{Axis, SensorKind};
use crate::spectral::{DominantPeak, PeakOrder};

/// Dominant frequencies of one axis
#[derive(Debug, Clone, Serialize)]
pub struct AxisReport {
    pub axis: Axis,
    pub peaks: Vec<DominantPeak>,
    /// Why the axis has no peaks, when its analysis failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-axis results of one sensor
#[derive(Debug, Clone, Serialize)]
pub struct SensorReport {
    pub sensor: SensorKind,
    pub unit: &'static str,
    pub axes: Vec<AxisReport>,
}

impl SensorReport {
    pub fn axis(&self, axis: Axis) -> Option<&AxisReport> {
        self.axes.iter().find(|a| a.axis == axis)
    }
}

/// Complete result of an analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    /// Name of the sample source
    pub device: String,
    /// Sampling rate used to place the frequency bins, in Hz
    pub sampling_rate: f64,
    /// Number of readings per axis after alignment
    pub sample_count: usize,
    /// Spacing of the frequency bins in Hz
    pub resolution: f64,
    /// Frames rejected by the decoder during collection
    pub dropped_frames: usize,
    pub peak_order: PeakOrder,
    pub sensors: Vec<SensorReport>,
}

impl AnalysisReport {
    pub fn new(
        device: impl Into<String>,
        sampling_rate: f64,
        sample_count: usize,
        dropped_frames: usize,
        peak_order: PeakOrder,
        sensors: Vec<SensorReport>,
    ) -> Self {
        let resolution = if sample_count > 0 {
            sampling_rate / sample_count as f64
        } else {
            0.0
        };
        Self {
            generated_at: Utc::now(),
            device: device.into(),
            sampling_rate,
            sample_count,
            resolution,
            dropped_frames,
            peak_order,
            sensors,
        }
    }

    pub fn sensor(&self, kind: SensorKind) -> Option<&SensorReport> {
        self.sensors.iter().find(|s| s.sensor == kind)
    }

    /// Peaks of one axis, empty when the axis failed or is absent
    pub fn peaks(&self, kind: SensorKind, axis: Axis) -> &[DominantPeak] {
        self.sensor(kind)
            .and_then(|s| s.axis(axis))
            .map(|a| a.peaks.as_slice())
            .unwrap_or(&[])
    }

    /// Number of axes whose analysis failed
    pub fn failed_axes(&self) -> usize {
        self.sensors
            .iter()
            .flat_map(|s| s.axes.iter())
            .filter(|a| a.error.is_some())
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize analysis report")
    }

    /// Write the report as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create report file at {:?}", path))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write analysis report to {:?}", path))?;
        info!("Analysis report written to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sensor in &self.sensors {
            writeln!(f, "\nDominant frequencies in {} data:", sensor.sensor)?;
            for axis in &sensor.axes {
                writeln!(f, "\n{}-axis:", axis.axis)?;
                if let Some(error) = &axis.error {
                    writeln!(f, "  analysis failed: {}", error)?;
                    continue;
                }
                for peak in &axis.peaks {
                    writeln!(
                        f,
                        "  {:.2} Hz (magnitude: {:.2})",
                        peak.frequency, peak.magnitude
                    )?;
                }
            }
        }
        Ok(())
    }
}
