// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Dominant frequency extraction
//!
//! Peaks are selected by magnitude rank only. There is no local-maximum
//! test, so two adjacent bins of one broad lobe can both be reported. Test
//! expectations throughout the crate are written against this behaviour.

use serde::{Deserialize, Serialize};

use super::fft::Spectrum;

/// A spectrum bin selected for its magnitude rank
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DominantPeak {
    /// Frequency in Hz
    pub frequency: f64,
    /// DFT magnitude at that frequency
    pub magnitude: f64,
    /// Index of the bin in the spectrum
    pub bin: usize,
}

/// Order in which [`dominant_peaks`] returns its selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakOrder {
    /// Largest magnitude first
    #[default]
    Descending,
    /// Largest magnitude last, as a tail of an ascending sort
    Ascending,
}

/// Default number of peaks reported per axis
pub const DEFAULT_PEAK_COUNT: usize = 3;

/// Select the `count` bins with the largest magnitude
///
/// The result is sorted by descending magnitude. Ties are broken by the lower
/// bin index first, which keeps the selection reproducible. When `count`
/// exceeds the number of bins every bin is returned.
///
/// # Example
///
/// ```
/// use witmotion_vibration::spectral::{dominant_peaks, FFTAnalyzer, SpectralAnalyzer, TimeSeries};
///
/// let samples: Vec<f64> = (0..50)
///     .map(|i| (2.0 * std::f64::consts::PI * 2.0 * i as f64 / 10.0).sin())
///     .collect();
/// let series = TimeSeries::new(samples, 10.0).unwrap();
/// let spectrum = FFTAnalyzer::new().compute_spectrum(&series).unwrap();
///
/// let peaks = dominant_peaks(&spectrum, 3);
/// assert_eq!(peaks.len(), 3);
/// assert!((peaks[0].frequency - 2.0).abs() < 1e-9);
/// ```
pub fn dominant_peaks(spectrum: &Spectrum, count: usize) -> Vec<DominantPeak> {
    let mut ranked: Vec<DominantPeak> = spectrum
        .iter()
        .enumerate()
        .map(|(bin, entry)| DominantPeak {
            frequency: entry.frequency,
            magnitude: entry.magnitude,
            bin,
        })
        .collect();

    // sort_by is stable, so equal magnitudes keep their bin order
    ranked.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    ranked.truncate(count);
    ranked
}

/// Same selection as [`dominant_peaks`], returned in the requested order
///
/// With [`PeakOrder::Ascending`] the strongest peak is the last element.
pub fn dominant_peaks_ordered(
    spectrum: &Spectrum,
    count: usize,
    order: PeakOrder,
) -> Vec<DominantPeak> {
    let mut peaks = dominant_peaks(spectrum, count);
    if order == PeakOrder::Ascending {
        peaks.reverse();
    }
    peaks
}
