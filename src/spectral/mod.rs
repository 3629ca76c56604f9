// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//!
//! # Spectral Analysis Module
//!
//! This module turns one axis of an inertial recording into a frequency
//! spectrum and extracts its dominant frequencies.
//!
//! ## Architecture
//!
//! - `SpectralAnalyzer` trait defines the interface for all analyzers
//! - `FFTAnalyzer` provides the concrete implementation using rustfft
//! - `dominant_peaks()` ranks the bins of a `Spectrum` by magnitude
//! - Factory function `create_spectral_analyzer()` instantiates the default analyzer
//!
//! ## Usage
//!
//! ```
//! use witmotion_vibration::spectral::{self, TimeSeries};
//!
//! let analyzer = spectral::create_spectral_analyzer();
//! let series = TimeSeries::new(vec![0.0, 1.0, 0.0, -1.0], 4.0).unwrap();
//!
//! let spectrum = analyzer.compute_spectrum(&series).unwrap();
//! let peaks = spectral::dominant_peaks(&spectrum, 1);
//! assert_eq!(peaks[0].frequency, 1.0);
//! ```

pub mod fft;
pub mod peaks;

pub use fft::{FFTAnalyzer, SpectralAnalyzer, Spectrum, SpectrumBin, TimeSeries};
pub use peaks::{dominant_peaks, dominant_peaks_ordered, DominantPeak, PeakOrder, DEFAULT_PEAK_COUNT};

/// Create the default spectral analyzer
pub fn create_spectral_analyzer() -> Box<dyn SpectralAnalyzer> {
    Box::new(FFTAnalyzer::new())
}

/// Compute the spectrum of `series` with the default analyzer
pub fn compute_spectrum(series: &TimeSeries) -> crate::Result<Spectrum> {
    FFTAnalyzer::new().compute_spectrum(series)
}
