// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Spectrum rendering
//!
//! Rendering is an injected collaborator of [`VibrationAnalyzer::run`]:
//! the analysis never depends on it, and [`NullRenderer`] turns it off.
//!
//! [`VibrationAnalyzer::run`]: super::VibrationAnalyzer::run

use std::io::{self, Write};

use crate::acquisition::{Axis, SensorKind};
use crate::error::Result;
use crate::spectral::{DominantPeak, Spectrum};

/// Everything known about one analyzed axis
#[derive(Debug, Clone, Copy)]
pub struct AxisView<'a> {
    pub sensor: SensorKind,
    pub axis: Axis,
    pub timestamps: &'a [f64],
    pub samples: &'a [f64],
    pub spectrum: &'a Spectrum,
    pub peaks: &'a [DominantPeak],
}

/// Draws the time series and spectrum of an analyzed axis
pub trait SpectrumRenderer {
    fn render(&mut self, view: &AxisView<'_>) -> Result<()>;
}

/// Renderer used when plotting is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl SpectrumRenderer for NullRenderer {
    fn render(&mut self, _view: &AxisView<'_>) -> Result<()> {
        Ok(())
    }
}

const DEFAULT_WIDTH: usize = 50;
const DEFAULT_MAX_ROWS: usize = 32;

/// Text renderer drawing each spectrum as a horizontal bar chart
///
/// Neighbouring bins are merged so that a chart never exceeds `max_rows`
/// lines; a merged row shows the largest magnitude it covers. Rows holding a
/// dominant peak are marked with `<`.
///
/// ```
/// use witmotion_vibration::analysis::{AxisView, ConsoleRenderer, SpectrumRenderer};
/// use witmotion_vibration::acquisition::{Axis, SensorKind};
/// use witmotion_vibration::spectral::{compute_spectrum, dominant_peaks, TimeSeries};
///
/// let samples = vec![0.0, 1.0, 0.0, -1.0];
/// let series = TimeSeries::new(samples.clone(), 4.0).unwrap();
/// let spectrum = compute_spectrum(&series).unwrap();
/// let peaks = dominant_peaks(&spectrum, 1);
///
/// let mut renderer = ConsoleRenderer::new(Vec::new());
/// renderer
///     .render(&AxisView {
///         sensor: SensorKind::Acceleration,
///         axis: Axis::X,
///         timestamps: &[0.0, 0.25, 0.5, 0.75],
///         samples: &samples,
///         spectrum: &spectrum,
///         peaks: &peaks,
///     })
///     .unwrap();
/// let text = String::from_utf8(renderer.into_inner()).unwrap();
/// assert!(text.contains("acceleration X-axis"));
/// ```
pub struct ConsoleRenderer<W: Write> {
    out: W,
    width: usize,
    max_rows: usize,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: DEFAULT_WIDTH,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Set the length of a full-scale bar in characters
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Set the maximum number of chart lines per spectrum
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_signal_summary(&mut self, view: &AxisView<'_>) -> io::Result<()> {
        let samples = view.samples;
        if samples.is_empty() {
            return Ok(());
        }
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let span = match (view.timestamps.first(), view.timestamps.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };
        writeln!(
            self.out,
            "  signal: {} samples over {:.2} s, min {:.3} / mean {:.3} / max {:.3} {}",
            samples.len(),
            span,
            min,
            mean,
            max,
            view.sensor.unit()
        )
    }

    fn write_chart(&mut self, view: &AxisView<'_>) -> io::Result<()> {
        let bins = view.spectrum.bins();
        if bins.is_empty() {
            return Ok(());
        }
        let full_scale = bins.iter().map(|b| b.magnitude).fold(0.0, f64::max);
        let per_row = bins.len().div_ceil(self.max_rows);

        for (row, chunk) in bins.chunks(per_row).enumerate() {
            let first_bin = row * per_row;
            let covered = first_bin..first_bin + chunk.len();
            let magnitude = chunk.iter().map(|b| b.magnitude).fold(0.0, f64::max);
            let length = if full_scale > 0.0 {
                (magnitude / full_scale * self.width as f64).round() as usize
            } else {
                0
            };
            let marker = if view.peaks.iter().any(|p| covered.contains(&p.bin)) {
                " <"
            } else {
                ""
            };
            writeln!(
                self.out,
                "  {:>8.2} Hz |{:<width$}|{}",
                chunk[0].frequency,
                "#".repeat(length),
                marker,
                width = self.width
            )?;
        }
        Ok(())
    }
}

impl<W: Write> SpectrumRenderer for ConsoleRenderer<W> {
    fn render(&mut self, view: &AxisView<'_>) -> Result<()> {
        writeln!(
            self.out,
            "\n{} {}-axis ({:.3} Hz resolution)",
            view.sensor,
            view.axis,
            view.spectrum.resolution()
        )?;
        self.write_signal_summary(view)?;
        self.write_chart(view)?;
        self.out.flush()?;
        Ok(())
    }
}
