// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Vibration Analysis
//!
//! Runs the spectral analyzer over the three axes of both sensors and turns
//! the spectra into an [`AnalysisReport`].
//!
//! ## Failure isolation
//!
//! Every axis is analyzed on its own. A failing axis is logged and kept in
//! the result as an error; the other five axes are still analyzed and
//! reported. Errors of the sample source (connection, collection, empty
//! data) abort the whole run instead.
//!
//! ## Example
//!
//! ```
//! use witmotion_vibration::acquisition::SimulatedDevice;
//! use witmotion_vibration::analysis::{NullRenderer, VibrationAnalyzer};
//! use witmotion_vibration::config::SimulationConfig;
//! use std::time::Duration;
//!
//! let mut device = SimulatedDevice::new(SimulationConfig::default(), 10.0);
//! let analyzer = VibrationAnalyzer::new(10.0, Duration::from_secs(20)).unwrap();
//!
//! let report = analyzer.run(&mut device, &mut NullRenderer).unwrap();
//! assert_eq!(report.sample_count, 200);
//! println!("{}", report);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info, warn};

pub mod renderer;
pub mod report;

pub use renderer::{AxisView, ConsoleRenderer, NullRenderer, SpectrumRenderer};
pub use report::{AnalysisReport, AxisReport, SensorReport};

use crate::acquisition::{
    align_recordings, collection_window, Axis, ConnectionGuard, MultiAxisRecording,
    SampleSource, SensorKind,
};
use crate::config::AnalysisConfig;
use crate::error::{Result, VibrationError};
use crate::spectral::{
    create_spectral_analyzer, dominant_peaks_ordered, DominantPeak, PeakOrder, SpectralAnalyzer,
    Spectrum, TimeSeries, DEFAULT_PEAK_COUNT,
};

/// Relative gap between the configured rate and the rate seen in the
/// timestamps above which a warning is logged
const RATE_MISMATCH_TOLERANCE: f64 = 0.2;

/// Spectra of the three axes of one sensor
#[derive(Debug)]
pub struct SensorSpectra {
    kind: SensorKind,
    axes: BTreeMap<Axis, Result<Spectrum>>,
}

impl SensorSpectra {
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Outcome of the analysis of `axis`
    pub fn get(&self, axis: Axis) -> Option<&Result<Spectrum>> {
        self.axes.get(&axis)
    }

    /// Spectrum of `axis`, if its analysis succeeded
    pub fn spectrum(&self, axis: Axis) -> Option<&Spectrum> {
        self.axes.get(&axis).and_then(|r| r.as_ref().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, &Result<Spectrum>)> {
        self.axes.iter().map(|(axis, result)| (*axis, result))
    }

    pub fn failed_axes(&self) -> usize {
        self.axes.values().filter(|r| r.is_err()).count()
    }
}

/// Analysis orchestrator
///
/// Holds the run parameters and the spectral analyzer. The sample source and
/// the renderer are borrowed per run.
pub struct VibrationAnalyzer {
    analyzer: Box<dyn SpectralAnalyzer>,
    sampling_rate: f64,
    duration: Duration,
    peak_count: usize,
    peak_order: PeakOrder,
}

impl VibrationAnalyzer {
    /// Create an orchestrator with the default analyzer and peak settings
    ///
    /// ### Errors
    ///
    /// Returns [`VibrationError::InvalidInput`] for a sampling rate that is
    /// not strictly positive.
    pub fn new(sampling_rate: f64, duration: Duration) -> Result<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(VibrationError::invalid_input(format!(
                "invalid sampling rate: {} Hz",
                sampling_rate
            )));
        }
        Ok(Self {
            analyzer: create_spectral_analyzer(),
            sampling_rate,
            duration,
            peak_count: DEFAULT_PEAK_COUNT,
            peak_order: PeakOrder::default(),
        })
    }

    /// Create an orchestrator from the `analysis` configuration section
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let duration = collection_window(config.duration_seconds)?;
        Ok(Self::new(config.sampling_rate, duration)?
            .with_peak_count(config.peak_count)
            .with_peak_order(config.peak_order))
    }

    pub fn with_peak_count(mut self, peak_count: usize) -> Self {
        self.peak_count = peak_count;
        self
    }

    pub fn with_peak_order(mut self, peak_order: PeakOrder) -> Self {
        self.peak_order = peak_order;
        self
    }

    /// Replace the spectral analyzer
    pub fn with_analyzer(mut self, analyzer: Box<dyn SpectralAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Dominant peaks of `spectrum` with the configured count and order
    pub fn peaks(&self, spectrum: &Spectrum) -> Vec<DominantPeak> {
        dominant_peaks_ordered(spectrum, self.peak_count, self.peak_order)
    }

    /// Compute the spectrum of every axis of both recordings
    ///
    /// `timestamps` are informational: frequency bins always come from the
    /// configured sampling rate.
    pub fn analyze(
        &self,
        timestamps: &[f64],
        accel: &MultiAxisRecording,
        gyro: &MultiAxisRecording,
    ) -> (SensorSpectra, SensorSpectra) {
        self.check_timestamps(timestamps);
        (self.analyze_sensor(accel), self.analyze_sensor(gyro))
    }

    fn analyze_sensor(&self, recording: &MultiAxisRecording) -> SensorSpectra {
        let kind = recording.kind();
        let axes = Axis::ALL
            .into_iter()
            .map(|axis| {
                let result = TimeSeries::new(recording.axis(axis).to_vec(), self.sampling_rate)
                    .and_then(|series| self.analyzer.compute_spectrum(&series));
                if let Err(e) = &result {
                    warn!("Analysis of {} {}-axis failed: {}", kind, axis, e);
                }
                (axis, result)
            })
            .collect();
        SensorSpectra { kind, axes }
    }

    fn check_timestamps(&self, timestamps: &[f64]) {
        let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
            return;
        };
        if timestamps.len() < 2 || last <= first {
            return;
        }
        let observed = (timestamps.len() - 1) as f64 / (last - first);
        debug!(
            "Observed sampling rate {:.3} Hz, configured {:.3} Hz",
            observed, self.sampling_rate
        );
        if (observed - self.sampling_rate).abs() > RATE_MISMATCH_TOLERANCE * self.sampling_rate {
            warn!(
                "Readings arrived at about {:.2} Hz but the analysis assumes {:.2} Hz",
                observed, self.sampling_rate
            );
        }
    }

    /// Summarize the spectra of one sensor
    pub fn summarize(&self, spectra: &SensorSpectra) -> SensorReport {
        let axes = spectra
            .iter()
            .map(|(axis, result)| match result {
                Ok(spectrum) => AxisReport {
                    axis,
                    peaks: self.peaks(spectrum),
                    error: None,
                },
                Err(e) => AxisReport {
                    axis,
                    peaks: Vec::new(),
                    error: Some(e.to_string()),
                },
            })
            .collect();
        SensorReport {
            sensor: spectra.kind(),
            unit: spectra.kind().unit(),
            axes,
        }
    }

    /// Hand every successfully analyzed axis to `renderer`
    ///
    /// Rendering failures are logged and never abort the run.
    pub fn render(
        &self,
        renderer: &mut dyn SpectrumRenderer,
        recording: &MultiAxisRecording,
        spectra: &SensorSpectra,
    ) {
        for axis in Axis::ALL {
            let Some(spectrum) = spectra.spectrum(axis) else {
                continue;
            };
            let peaks = self.peaks(spectrum);
            let view = AxisView {
                sensor: recording.kind(),
                axis,
                timestamps: recording.timestamps(),
                samples: recording.axis(axis),
                spectrum,
                peaks: &peaks,
            };
            if let Err(e) = renderer.render(&view) {
                warn!("Failed to render {} {}-axis: {}", recording.kind(), axis, e);
            }
        }
    }

    /// Connect, collect, align, analyze and report
    ///
    /// The source is disconnected on every exit path once it has connected.
    ///
    /// ### Errors
    ///
    /// - [`VibrationError::ConnectionFailure`] when the source cannot connect
    /// - [`VibrationError::InsufficientData`] when nothing usable was collected
    /// - any error returned by the source during collection
    pub fn run(
        &self,
        source: &mut dyn SampleSource,
        renderer: &mut dyn SpectrumRenderer,
    ) -> Result<AnalysisReport> {
        let device = source.name().to_string();
        let data = {
            let mut link = ConnectionGuard::connect(source)?;
            link.collect_data(self.duration)?
        };

        if data.acceleration.is_empty() && data.gyroscope.is_empty() {
            return Err(VibrationError::insufficient_data("no data collected"));
        }
        let dropped_frames = data.dropped_frames;
        let (accel, gyro) = align_recordings(data.acceleration, data.gyroscope)?;
        info!("Using {} data points for analysis", accel.len());

        let (accel_spectra, gyro_spectra) = self.analyze(accel.timestamps(), &accel, &gyro);

        self.render(renderer, &accel, &accel_spectra);
        self.render(renderer, &gyro, &gyro_spectra);

        Ok(AnalysisReport::new(
            device,
            self.sampling_rate,
            accel.len(),
            dropped_frames,
            self.peak_order,
            vec![
                self.summarize(&accel_spectra),
                self.summarize(&gyro_spectra),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::CollectedData;
    use crate::spectral::FFTAnalyzer;
    use std::f64::consts::PI;

    fn tone(n: usize, fs: f64, frequency: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * frequency * i as f64 / fs).sin())
            .collect()
    }

    fn recording(kind: SensorKind, n: usize, fs: f64, frequencies: [f64; 3]) -> MultiAxisRecording {
        let x = tone(n, fs, frequencies[0]);
        let y = tone(n, fs, frequencies[1]);
        let z = tone(n, fs, frequencies[2]);
        let timestamps = (0..n).map(|i| i as f64 / fs).collect();
        let readings: Vec<[f64; 3]> = (0..n).map(|i| [x[i], y[i], z[i]]).collect();
        MultiAxisRecording::from_vectors(kind, timestamps, &readings).unwrap()
    }

    /// Source replaying a fixed data set
    struct ReplaySource {
        data: Option<CollectedData>,
        connected: bool,
        disconnects: usize,
        fail_collection: bool,
    }

    impl ReplaySource {
        fn new(data: CollectedData) -> Self {
            Self {
                data: Some(data),
                connected: false,
                disconnects: 0,
                fail_collection: false,
            }
        }
    }

    impl SampleSource for ReplaySource {
        fn name(&self) -> &str {
            "replay"
        }
        fn connect(&mut self) -> bool {
            self.connected = true;
            true
        }
        fn collect_data(&mut self, _duration: Duration) -> Result<CollectedData> {
            if self.fail_collection {
                return Err(VibrationError::Io {
                    source: std::io::Error::other("link lost"),
                });
            }
            Ok(self.data.take().unwrap_or_default())
        }
        fn disconnect(&mut self) {
            self.connected = false;
            self.disconnects += 1;
        }
        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    /// Analyzer rejecting series with saturated samples
    struct FailingAnalyzer;

    impl SpectralAnalyzer for FailingAnalyzer {
        fn compute_spectrum(&self, series: &TimeSeries) -> Result<Spectrum> {
            if series.samples().iter().any(|s| *s > 0.9) {
                return Err(VibrationError::invalid_input("saturated axis"));
            }
            FFTAnalyzer::new().compute_spectrum(series)
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Vec<(SensorKind, Axis, usize)>,
    }

    impl SpectrumRenderer for RecordingRenderer {
        fn render(&mut self, view: &AxisView<'_>) -> Result<()> {
            self.rendered.push((view.sensor, view.axis, view.peaks.len()));
            Ok(())
        }
    }

    #[test]
    fn test_analyze_returns_all_axes() {
        let analyzer = VibrationAnalyzer::new(10.0, Duration::from_secs(5)).unwrap();
        let accel = recording(SensorKind::Acceleration, 50, 10.0, [1.0, 2.0, 3.0]);
        let gyro = recording(SensorKind::AngularVelocity, 50, 10.0, [0.4, 2.4, 4.0]);

        let (accel_spectra, gyro_spectra) = analyzer.analyze(accel.timestamps(), &accel, &gyro);
        assert_eq!(accel_spectra.kind(), SensorKind::Acceleration);
        for axis in Axis::ALL {
            assert_eq!(accel_spectra.spectrum(axis).unwrap().len(), 26);
            assert_eq!(gyro_spectra.spectrum(axis).unwrap().len(), 26);
        }

        let y = analyzer.peaks(accel_spectra.spectrum(Axis::Y).unwrap());
        assert!((y[0].frequency - 2.0).abs() < 1e-9);
        let z = analyzer.peaks(gyro_spectra.spectrum(Axis::Z).unwrap());
        assert!((z[0].frequency - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_bins_come_from_configured_rate_not_timestamps() {
        let analyzer = VibrationAnalyzer::new(20.0, Duration::from_secs(5)).unwrap();
        let accel = recording(SensorKind::Acceleration, 40, 10.0, [1.0, 1.0, 1.0]);
        let gyro = recording(SensorKind::AngularVelocity, 40, 10.0, [1.0, 1.0, 1.0]);

        let (spectra, _) = analyzer.analyze(accel.timestamps(), &accel, &gyro);
        let spectrum = spectra.spectrum(Axis::X).unwrap();
        assert!((spectrum.resolution() - 0.5).abs() < 1e-12);
        assert!((analyzer.peaks(spectrum)[0].frequency - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_failing_axis_does_not_stop_the_others() {
        let analyzer = VibrationAnalyzer::new(10.0, Duration::from_secs(5))
            .unwrap()
            .with_analyzer(Box::new(FailingAnalyzer));
        let mut accel = MultiAxisRecording::new(SensorKind::Acceleration);
        let mut gyro = MultiAxisRecording::new(SensorKind::AngularVelocity);
        for i in 0..20 {
            let t = i as f64 / 10.0;
            accel.push(t, [0.1, 5.0, 0.2]);
            gyro.push(t, [0.1, 0.1, 0.1]);
        }

        let (accel_spectra, gyro_spectra) = analyzer.analyze(accel.timestamps(), &accel, &gyro);
        assert_eq!(accel_spectra.failed_axes(), 1);
        assert!(matches!(
            accel_spectra.get(Axis::Y),
            Some(Err(VibrationError::InvalidInput { .. }))
        ));
        assert!(accel_spectra.spectrum(Axis::X).is_some());
        assert!(accel_spectra.spectrum(Axis::Z).is_some());
        assert_eq!(gyro_spectra.failed_axes(), 0);

        let report = analyzer.summarize(&accel_spectra);
        assert!(report.axis(Axis::Y).unwrap().error.is_some());
        assert_eq!(report.axis(Axis::X).unwrap().peaks.len(), 3);
    }

    #[test]
    fn test_run_aligns_and_reports() {
        let data = CollectedData {
            acceleration: recording(SensorKind::Acceleration, 100, 10.0, [1.0, 2.0, 3.0]),
            gyroscope: recording(SensorKind::AngularVelocity, 80, 10.0, [1.0, 2.0, 3.0]),
            dropped_frames: 4,
        };
        let mut source = ReplaySource::new(data);
        let mut renderer = RecordingRenderer::default();
        let analyzer = VibrationAnalyzer::new(10.0, Duration::from_secs(10))
            .unwrap()
            .with_peak_count(2);

        let report = analyzer.run(&mut source, &mut renderer).unwrap();
        assert_eq!(report.sample_count, 80);
        assert_eq!(report.dropped_frames, 4);
        assert_eq!(report.device, "replay");
        assert_eq!(report.sensors.len(), 2);
        let peaks = report.peaks(SensorKind::AngularVelocity, Axis::Z);
        assert_eq!(peaks.len(), 2);
        assert!((peaks[0].frequency - 3.0).abs() < 1e-9);

        assert_eq!(renderer.rendered.len(), 6);
        assert!(renderer.rendered.iter().all(|(_, _, n)| *n == 2));
        assert_eq!(source.disconnects, 1);
        assert!(!source.is_connected());
    }

    #[test]
    fn test_run_with_no_data_is_insufficient() {
        let mut source = ReplaySource::new(CollectedData::new());
        let analyzer = VibrationAnalyzer::new(10.0, Duration::from_secs(1)).unwrap();
        let result = analyzer.run(&mut source, &mut NullRenderer);
        assert!(matches!(
            result,
            Err(VibrationError::InsufficientData { .. })
        ));
        assert_eq!(source.disconnects, 1);
    }

    #[test]
    fn test_run_with_one_empty_sensor_is_insufficient() {
        let data = CollectedData {
            acceleration: recording(SensorKind::Acceleration, 30, 10.0, [1.0, 2.0, 3.0]),
            gyroscope: MultiAxisRecording::new(SensorKind::AngularVelocity),
            dropped_frames: 0,
        };
        let mut source = ReplaySource::new(data);
        let analyzer = VibrationAnalyzer::new(10.0, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            analyzer.run(&mut source, &mut NullRenderer),
            Err(VibrationError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_collection_error_still_disconnects() {
        let mut source = ReplaySource::new(CollectedData::new());
        source.fail_collection = true;
        let analyzer = VibrationAnalyzer::new(10.0, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            analyzer.run(&mut source, &mut NullRenderer),
            Err(VibrationError::Io { .. })
        ));
        assert_eq!(source.disconnects, 1);
    }

    #[test]
    fn test_rejects_invalid_sampling_rate() {
        assert!(VibrationAnalyzer::new(0.0, Duration::from_secs(1)).is_err());
        assert!(VibrationAnalyzer::new(f64::NAN, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = AnalysisConfig {
            duration_seconds: 2.5,
            peak_count: 5,
            peak_order: PeakOrder::Ascending,
            ..AnalysisConfig::default()
        };
        let analyzer = VibrationAnalyzer::from_config(&config).unwrap();
        assert_eq!(analyzer.duration(), Duration::from_millis(2500));
        assert_eq!(analyzer.sampling_rate(), 10.0);
        assert_eq!(analyzer.peak_count, 5);
        assert_eq!(analyzer.peak_order, PeakOrder::Ascending);
    }
}
