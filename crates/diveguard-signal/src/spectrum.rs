//! Windowed magnitude spectrum
//!
//! Applies a symmetric Hann taper to a normalised sample block, runs a forward
//! FFT and keeps the non-negative frequency half (`n/2 + 1` bins), which is
//! what a real FFT produces. Magnitudes are scaled so the strongest bin is 1.0.

use ndarray::Array1;
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::{Result, SignalError};

/// Normalised magnitude spectrum of one acoustic block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagnitudeSpectrum {
    /// Bin centre frequencies in Hz (0 to Nyquist)
    pub frequencies: Array1<f64>,
    /// Magnitudes normalised to the maximum bin (all zero for a silent block)
    pub magnitudes: Array1<f64>,
    /// Sample rate the block was captured at
    pub sample_rate_hz: f64,
    /// FFT length (number of input samples)
    pub fft_len: usize,
}

impl MagnitudeSpectrum {
    /// Compute the Hann-windowed, max-normalised magnitude spectrum.
    pub fn compute(samples: &[f64], sample_rate_hz: f64) -> Result<Self> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(SignalError::InvalidSampleRate(sample_rate_hz));
        }
        if samples.is_empty() {
            return Err(SignalError::DataValidation("empty sample block".into()));
        }

        let n = samples.len();
        let window = hann_window(n);

        let mut buffer: Vec<Complex64> = samples
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex64::new(s * w, 0.0))
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let n_bins = n / 2 + 1;
        let mut magnitudes: Array1<f64> = buffer.iter().take(n_bins).map(|c| c.norm()).collect();

        let max = magnitudes.iter().cloned().fold(0.0f64, f64::max);
        if max > 0.0 {
            magnitudes.mapv_inplace(|m| m / max);
        }

        let resolution = sample_rate_hz / n as f64;
        let frequencies = Array1::from_shape_fn(n_bins, |k| k as f64 * resolution);

        Ok(Self {
            frequencies,
            magnitudes,
            sample_rate_hz,
            fft_len: n,
        })
    }

    /// Number of frequency bins
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    /// True when the spectrum has no bins
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Width of one bin in Hz
    pub fn resolution_hz(&self) -> f64 {
        self.sample_rate_hz / self.fft_len as f64
    }

    /// Iterate `(frequency, magnitude)` over bins whose frequency satisfies `keep`.
    pub fn bins_where<'a, F>(&'a self, keep: F) -> impl Iterator<Item = (f64, f64)> + 'a
    where
        F: Fn(f64) -> bool + 'a,
    {
        self.frequencies
            .iter()
            .zip(self.magnitudes.iter())
            .filter(move |(f, _)| keep(**f))
            .map(|(&f, &m)| (f, m))
    }

    /// True when every bin is zero (silent or DC-free zero block)
    pub fn is_silent(&self) -> bool {
        self.magnitudes.iter().all(|&m| m == 0.0)
    }
}

/// Symmetric Hann window of length `size`.
///
/// `w[i] = 0.5 * (1 - cos(2*pi*i / (size - 1)))`; a single-sample window is `[1.0]`.
pub fn hann_window(size: usize) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos()))
        .collect()
}
