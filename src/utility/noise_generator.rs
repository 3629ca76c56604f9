// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Synthetic Vibration Signal Generator
//!
//! This module generates reproducible test signals for the vibration
//! analyzer:
//!
//! 1. Gaussian white noise, for background sensor noise
//! 2. Vibration tones, a sinusoid on top of a constant offset with optional noise
//!
//! The generator drives the simulated WitMotion device and the test suite.
//!
//! ## Features
//!
//! * Fast XORShift pseudo-random number generation
//! * Box-Muller transform for Gaussian distribution
//! * Deterministic output for a given seed
//!
//! ## Example
//!
//! ```rust
//! use witmotion_vibration::utility::noise_generator::NoiseGenerator;
//!
//! let mut generator = NoiseGenerator::new(12345);
//!
//! // 5 seconds of a 2 Hz, 1 g vibration at 10 Hz with a 1 g gravity offset
//! let z = generator.generate_tone(50, 10.0, 2.0, 1.0, 1.0, 0.01);
//! assert_eq!(z.len(), 50);
//! ```

use std::f64::consts::PI;

/// Seed substituted for zero, which would lock XORShift at zero forever
const FALLBACK_SEED: u32 = 0x9e37_79b9;

/// Random number generator using the XORShift algorithm
///
/// This generator is fast and lightweight. It is suitable for generating
/// noise samples but must not be used for cryptographic purposes.
pub struct NoiseGenerator {
    rng_state: u32,
}

impl NoiseGenerator {
    /// Creates a new noise generator with a given seed.
    ///
    /// Using the same seed produces the same sequence of values.
    pub fn new(seed: u32) -> Self {
        let rng_state = if seed == 0 { FALLBACK_SEED } else { seed };
        Self { rng_state }
    }

    /// Generates a random number between -1.0 and 1.0.
    pub fn random_float(&mut self) -> f64 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;

        (self.rng_state as f64 / u32::MAX as f64) * 2.0 - 1.0
    }

    /// Generates a value from a standard Gaussian distribution.
    ///
    /// Uses the Box-Muller transform:
    /// ```text
    /// z = sqrt(-2 * ln(u1)) * cos(2 * π * u2)
    /// ```
    /// where u1 and u2 are uniform in (0,1).
    pub fn random_gaussian(&mut self) -> f64 {
        let u1 = (self.random_float() + 1.0) / 2.0;
        let u2 = (self.random_float() + 1.0) / 2.0;

        // Avoid ln(0)
        let u1 = u1.max(0.0001);

        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Generates `num_samples` of Gaussian white noise scaled by `amplitude`.
    pub fn generate_noise(&mut self, num_samples: usize, amplitude: f64) -> Vec<f64> {
        (0..num_samples)
            .map(|_| self.random_gaussian() * amplitude)
            .collect()
    }

    /// Value of a noisy tone at time `t` seconds
    ///
    /// `offset + amplitude * sin(2π f t) + noise_amplitude * N(0, 1)`
    pub fn tone_sample(
        &mut self,
        t: f64,
        frequency: f64,
        amplitude: f64,
        offset: f64,
        noise_amplitude: f64,
    ) -> f64 {
        let noise = if noise_amplitude > 0.0 {
            self.random_gaussian() * noise_amplitude
        } else {
            0.0
        };
        offset + amplitude * (2.0 * PI * frequency * t).sin() + noise
    }

    /// Generates a sampled vibration tone.
    ///
    /// # Arguments
    ///
    /// * `num_samples` - Number of samples to produce
    /// * `sampling_rate` - Sampling rate in Hz
    /// * `frequency` - Tone frequency in Hz
    /// * `amplitude` - Peak amplitude of the sinusoid
    /// * `offset` - Constant added to every sample (DC component)
    /// * `noise_amplitude` - Standard deviation of the added Gaussian noise
    pub fn generate_tone(
        &mut self,
        num_samples: usize,
        sampling_rate: f64,
        frequency: f64,
        amplitude: f64,
        offset: f64,
        noise_amplitude: f64,
    ) -> Vec<f64> {
        (0..num_samples)
            .map(|i| {
                let t = i as f64 / sampling_rate;
                self.tone_sample(t, frequency, amplitude, offset, noise_amplitude)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = NoiseGenerator::new(42);
        let mut b = NoiseGenerator::new(42);
        for _ in 0..100 {
            assert_eq!(a.random_float(), b.random_float());
        }
    }

    #[test]
    fn test_zero_seed_still_produces_noise() {
        let mut generator = NoiseGenerator::new(0);
        let samples = generator.generate_noise(16, 1.0);
        assert!(samples.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_random_float_range() {
        let mut generator = NoiseGenerator::new(7);
        for _ in 0..10_000 {
            let value = generator.random_float();
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_gaussian_statistics() {
        let mut generator = NoiseGenerator::new(12345);
        let samples = generator.generate_noise(20_000, 1.0);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.05, "mean = {}", mean);
        assert!((variance.sqrt() - 1.0).abs() < 0.1, "std = {}", variance.sqrt());
    }

    #[test]
    fn test_noiseless_tone_is_exact() {
        let mut generator = NoiseGenerator::new(1);
        let tone = generator.generate_tone(4, 4.0, 1.0, 2.0, 0.5, 0.0);
        let expected = [0.5, 2.5, 0.5, -1.5];
        for (value, expected) in tone.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-12);
        }
    }
}
