// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Fast Fourier Transform (FFT) implementation for spectral analysis
//!
//! This module converts one axis of a sensor recording into its magnitude
//! spectrum. The transform runs over the whole series as given: no window
//! function, no zero-padding and no detrending are applied, so the DC
//! component of a biased axis (gravity on Z, for instance) shows up in bin 0.
//!
//! # Example
//!
//! ```
//! use witmotion_vibration::spectral::fft::{FFTAnalyzer, SpectralAnalyzer, TimeSeries};
//!
//! // 5 seconds of a 2 Hz vibration sampled at 10 Hz
//! let sampling_rate = 10.0;
//! let samples: Vec<f64> = (0..50)
//!     .map(|i| (2.0 * std::f64::consts::PI * 2.0 * i as f64 / sampling_rate).sin())
//!     .collect();
//!
//! let series = TimeSeries::new(samples, sampling_rate).unwrap();
//! let spectrum = FFTAnalyzer::new().compute_spectrum(&series).unwrap();
//!
//! assert_eq!(spectrum.len(), 26);
//! assert_eq!(spectrum.resolution(), 0.2);
//! ```

use log::debug;
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;

use crate::error::{Result, VibrationError};

/// Trait for implementing spectral analysis algorithms
///
/// Implementations must be pure: the same series always yields the same
/// spectrum and no state is carried between calls. This keeps analyzers
/// usable from several threads at once.
pub trait SpectralAnalyzer: Send + Sync {
    /// Compute the non-negative frequency magnitude spectrum of `series`
    ///
    /// ### Errors
    ///
    /// Returns [`VibrationError::InvalidInput`] when the series is empty or
    /// contains non-finite samples.
    fn compute_spectrum(&self, series: &TimeSeries) -> Result<Spectrum>;
}

/// Uniformly sampled real-valued signal
///
/// Samples are assumed to be equally spaced at `sampling_rate`. Acquisition
/// timestamps are never consulted, even when they drift.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    samples: Vec<f64>,
    sampling_rate: f64,
}

impl TimeSeries {
    /// Build a series from raw samples and a sampling rate in Hz
    ///
    /// The sampling rate must be finite and strictly positive. Emptiness is
    /// checked later by the analyzer so that it can report it as a failed
    /// computation.
    pub fn new(samples: Vec<f64>, sampling_rate: f64) -> Result<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(VibrationError::invalid_input(format!(
                "sampling rate must be a positive number of Hz, got {}",
                sampling_rate
            )));
        }
        Ok(Self {
            samples,
            sampling_rate,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration covered by the samples in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate
    }
}

/// One frequency bin of a spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectrumBin {
    /// Bin center frequency in Hz
    pub frequency: f64,
    /// Modulus of the DFT coefficient
    pub magnitude: f64,
}

/// Magnitude spectrum of a time series
///
/// Holds the bins `k = 0 ..= n/2` of an `n`-point DFT, sorted by ascending
/// frequency. Bin `k` sits at `k * sampling_rate / n`. For even `n` the last
/// bin is the Nyquist bin and is reported at `+sampling_rate / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    bins: Vec<SpectrumBin>,
    sampling_rate: f64,
    sample_count: usize,
}

impl Spectrum {
    pub fn bins(&self) -> &[SpectrumBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpectrumBin> {
        self.bins.iter()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.bins.iter().map(|bin| bin.frequency).collect()
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.bins.iter().map(|bin| bin.magnitude).collect()
    }

    /// Sampling rate of the analyzed series in Hz
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Number of samples in the analyzed series
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Frequency spacing between adjacent bins (`fs / n`)
    pub fn resolution(&self) -> f64 {
        self.sampling_rate / self.sample_count as f64
    }

    /// Bin with the largest magnitude, lowest frequency first on ties
    pub fn strongest_bin(&self) -> Option<SpectrumBin> {
        self.bins.iter().copied().reduce(|best, bin| {
            if bin.magnitude > best.magnitude {
                bin
            } else {
                best
            }
        })
    }
}

impl<'a> IntoIterator for &'a Spectrum {
    type Item = &'a SpectrumBin;
    type IntoIter = std::slice::Iter<'a, SpectrumBin>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

/// Number of non-negative frequency bins produced for `n` samples
pub fn bin_count(n: usize) -> usize {
    n / 2 + 1
}

/// Frequency of bin `k` of an `n`-point DFT sampled at `sampling_rate`
pub fn bin_frequency(k: usize, n: usize, sampling_rate: f64) -> f64 {
    k as f64 * sampling_rate / n as f64
}

/// FFT-based spectral analyzer backed by rustfft
#[derive(Debug, Default, Clone, Copy)]
pub struct FFTAnalyzer;

impl FFTAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compute the complex DFT of the input signal
    ///
    /// The real input is promoted to complex numbers with a zero imaginary
    /// part and transformed in place. The output holds all `n` coefficients,
    /// DC at index 0.
    fn compute_fft(&self, signal: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(signal.len());
        fft.process(&mut buffer);

        buffer
    }

    /// Keep the non-negative frequency half of the transform
    fn fft_to_spectrum(&self, fft_output: &[Complex64], sampling_rate: f64) -> Spectrum {
        let n = fft_output.len();
        let bins = fft_output
            .iter()
            .take(bin_count(n))
            .enumerate()
            .map(|(k, coefficient)| SpectrumBin {
                frequency: bin_frequency(k, n, sampling_rate),
                magnitude: coefficient.norm(),
            })
            .collect();

        Spectrum {
            bins,
            sampling_rate,
            sample_count: n,
        }
    }
}

impl SpectralAnalyzer for FFTAnalyzer {
    fn compute_spectrum(&self, series: &TimeSeries) -> Result<Spectrum> {
        if series.is_empty() {
            return Err(VibrationError::invalid_input(
                "cannot compute the spectrum of an empty series",
            ));
        }
        if let Some(position) = series.samples().iter().position(|v| !v.is_finite()) {
            return Err(VibrationError::invalid_input(format!(
                "sample {} is not a finite number",
                position
            )));
        }

        let fft_output = self.compute_fft(series.samples());
        let spectrum = self.fft_to_spectrum(&fft_output, series.sampling_rate());
        debug!(
            "Computed {} bins from {} samples at {} Hz (resolution {:.4} Hz)",
            spectrum.len(),
            series.len(),
            series.sampling_rate(),
            spectrum.resolution()
        );
        Ok(spectrum)
    }
}
