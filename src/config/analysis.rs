// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Analysis run configuration

use serde::{Deserialize, Serialize};

use crate::spectral::{PeakOrder, DEFAULT_PEAK_COUNT};

/// Configuration of one analysis run.
///
/// The sampling rate is the sensor's configured output rate. It is trusted
/// as given: frequency bins are derived from it, never from the timestamps
/// recorded during collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Sensor output rate in Hz. WitMotion sensors default to 10 Hz and
    /// support 0.2 Hz to 200 Hz.
    pub sampling_rate: f64,

    /// Length of the collection window in seconds.
    pub duration_seconds: f64,

    /// Number of dominant frequencies reported per axis.
    pub peak_count: usize,

    /// Order of the reported peaks.
    #[serde(default)]
    pub peak_order: PeakOrder,

    /// Render time series and spectra after the analysis.
    #[serde(default)]
    pub plot: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 10.0,
            duration_seconds: 120.0,
            peak_count: DEFAULT_PEAK_COUNT,
            peak_order: PeakOrder::Descending,
            plot: false,
        }
    }
}
