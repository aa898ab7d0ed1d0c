//! Spectral Feature Extraction Module
//!
//! Derives the scalar descriptors used for propeller classification from one
//! hydrophone block: spectral peaks, blade-pass frequency candidate, spectral
//! centroid, kurtosis, low/mid/high band energies and cavitation-band energy.
//!
//! Blocks shorter than [`FeatureExtractorConfig::min_samples`] produce a
//! zeroed [`SpectralFeatures`] with [`FeatureStatus::InsufficientData`]
//! rather than an error, so downstream stages degrade to "no classification".

use crate::pcm::AcousticBuffer;
use crate::peaks::{find_peaks, PeakConfig, SpectralPeak};
use crate::spectrum::MagnitudeSpectrum;
use crate::{Result, SignalError};

/// Outcome of a feature extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureStatus {
    /// Full extraction performed
    Complete,
    /// Buffer absent or too short; all fields are zero / empty
    InsufficientData,
}

/// Spectral descriptors of one acoustic block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectralFeatures {
    /// Extraction outcome
    pub status: FeatureStatus,
    /// Selected peaks in ascending frequency order
    pub peaks: Vec<SpectralPeak>,
    /// Blade-pass frequency candidate in Hz (0 when none found)
    pub bpf_hz: f64,
    /// Normalised magnitude of the blade-pass peak
    pub bpf_power: f64,
    /// Magnitude-weighted mean frequency (Hz)
    pub spectral_centroid_hz: f64,
    /// Fourth standardised moment of the magnitude spectrum
    pub kurtosis: f64,
    /// Summed magnitude below the low band edge
    pub energy_low: f64,
    /// Summed magnitude between the low and high band edges
    pub energy_mid: f64,
    /// Summed magnitude at or above the high band edge
    pub energy_high: f64,
    /// Mean magnitude inside the cavitation band
    pub cavitation_level: f64,
}

impl SpectralFeatures {
    /// Zeroed features flagged as insufficient data.
    pub fn insufficient() -> Self {
        Self {
            status: FeatureStatus::InsufficientData,
            peaks: Vec::new(),
            bpf_hz: 0.0,
            bpf_power: 0.0,
            spectral_centroid_hz: 0.0,
            kurtosis: 0.0,
            energy_low: 0.0,
            energy_mid: 0.0,
            energy_high: 0.0,
            cavitation_level: 0.0,
        }
    }

    /// True when a full extraction was performed
    pub fn is_complete(&self) -> bool {
        self.status == FeatureStatus::Complete
    }

    /// Peaks ordered by power (strongest first), truncated to `limit`.
    ///
    /// Equal powers keep ascending frequency order.
    pub fn ranked_peaks(&self, limit: usize) -> Vec<SpectralPeak> {
        let mut ranked = self.peaks.clone();
        ranked.sort_by(|a, b| b.power.total_cmp(&a.power));
        ranked.truncate(limit);
        ranked
    }

    /// Number of peaks strictly between 0 Hz and `below_hz`.
    pub fn harmonic_count(&self, below_hz: f64) -> usize {
        self.peaks
            .iter()
            .filter(|p| p.frequency_hz > 0.0 && p.frequency_hz < below_hz)
            .count()
    }
}

/// Configuration for spectral feature extraction
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureExtractorConfig {
    /// Hydrophone sample rate (Hz)
    pub sample_rate_hz: f64,
    /// Minimum block length for a full extraction
    pub min_samples: usize,
    /// Peak picking thresholds
    pub peaks: PeakConfig,
    /// Blade-pass candidates must lie below this frequency (Hz)
    pub bpf_max_hz: f64,
    /// Upper edge of the low band (Hz)
    pub low_band_edge_hz: f64,
    /// Upper edge of the mid band (Hz)
    pub high_band_edge_hz: f64,
    /// Cavitation band, inclusive (Hz)
    pub cavitation_band_hz: (f64, f64),
}

impl Default for FeatureExtractorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000.0,
            min_samples: 512,
            peaks: PeakConfig::default(),
            bpf_max_hz: 500.0,
            low_band_edge_hz: 100.0,
            high_band_edge_hz: 1000.0,
            cavitation_band_hz: (5_000.0, 30_000.0),
        }
    }
}

impl FeatureExtractorConfig {
    /// Create a new configuration builder
    pub fn builder() -> FeatureExtractorConfigBuilder {
        FeatureExtractorConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(SignalError::InvalidSampleRate(self.sample_rate_hz));
        }
        if self.min_samples < 3 {
            return Err(SignalError::InvalidConfig(
                "min_samples must be at least 3".into(),
            ));
        }
        if self.low_band_edge_hz >= self.high_band_edge_hz {
            return Err(SignalError::InvalidConfig(
                "low band edge must be below high band edge".into(),
            ));
        }
        if self.cavitation_band_hz.0 > self.cavitation_band_hz.1 {
            return Err(SignalError::InvalidConfig(
                "cavitation band is inverted".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for FeatureExtractorConfig
#[derive(Debug, Default)]
pub struct FeatureExtractorConfigBuilder {
    config: FeatureExtractorConfig,
}

impl FeatureExtractorConfigBuilder {
    /// Set the hydrophone sample rate
    pub fn sample_rate_hz(mut self, rate: f64) -> Self {
        self.config.sample_rate_hz = rate;
        self
    }

    /// Set the minimum block length
    pub fn min_samples(mut self, n: usize) -> Self {
        self.config.min_samples = n;
        self
    }

    /// Set peak picking thresholds
    pub fn peaks(mut self, peaks: PeakConfig) -> Self {
        self.config.peaks = peaks;
        self
    }

    /// Set the blade-pass search ceiling
    pub fn bpf_max_hz(mut self, hz: f64) -> Self {
        self.config.bpf_max_hz = hz;
        self
    }

    /// Set the cavitation band
    pub fn cavitation_band_hz(mut self, low: f64, high: f64) -> Self {
        self.config.cavitation_band_hz = (low, high);
        self
    }

    /// Build the configuration
    pub fn build(self) -> FeatureExtractorConfig {
        self.config
    }
}

/// Spectral feature extractor
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureExtractorConfig,
}

impl FeatureExtractor {
    /// Create a new extractor, validating the configuration
    pub fn new(config: FeatureExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create with default configuration (48 kHz, 512-sample minimum)
    pub fn with_defaults() -> Self {
        Self {
            config: FeatureExtractorConfig::default(),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &FeatureExtractorConfig {
        &self.config
    }

    /// Extract features at the configured sample rate.
    pub fn extract(&self, buffer: AcousticBuffer<'_>) -> Result<SpectralFeatures> {
        self.extract_at(buffer, self.config.sample_rate_hz)
    }

    /// Extract features from a block captured at `sample_rate_hz`.
    ///
    /// Errors only on a malformed block (non-finite samples) or sample rate;
    /// a short block is reported through [`FeatureStatus::InsufficientData`].
    pub fn extract_at(
        &self,
        buffer: AcousticBuffer<'_>,
        sample_rate_hz: f64,
    ) -> Result<SpectralFeatures> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(SignalError::InvalidSampleRate(sample_rate_hz));
        }
        if buffer.len() < self.config.min_samples {
            tracing::debug!(
                samples = buffer.len(),
                required = self.config.min_samples,
                "Acoustic block too short for spectral analysis"
            );
            return Ok(SpectralFeatures::insufficient());
        }

        let samples = buffer.to_normalized();
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(SignalError::DataValidation(format!(
                "non-finite sample at index {}",
                pos
            )));
        }

        let spectrum = MagnitudeSpectrum::compute(&samples, sample_rate_hz)?;
        Ok(self.features_from_spectrum(&spectrum))
    }

    /// Derive features from an already computed spectrum.
    pub fn features_from_spectrum(&self, spectrum: &MagnitudeSpectrum) -> SpectralFeatures {
        let mags = spectrum.magnitudes.as_slice().unwrap_or(&[]);
        let peaks: Vec<SpectralPeak> = find_peaks(mags, &self.config.peaks)
            .into_iter()
            .map(|bin| SpectralPeak {
                bin,
                frequency_hz: spectrum.frequencies[bin],
                power: spectrum.magnitudes[bin],
            })
            .collect();

        let (bpf_hz, bpf_power) = self.blade_pass_candidate(&peaks);
        let spectral_centroid_hz = spectral_centroid(spectrum);
        let kurtosis = kurtosis(mags);

        let low_edge = self.config.low_band_edge_hz;
        let high_edge = self.config.high_band_edge_hz;
        let energy_low: f64 = spectrum.bins_where(move |f| f < low_edge).map(|(_, m)| m).sum();
        let energy_mid: f64 = spectrum
            .bins_where(move |f| f >= low_edge && f < high_edge)
            .map(|(_, m)| m)
            .sum();
        let energy_high: f64 = spectrum.bins_where(move |f| f >= high_edge).map(|(_, m)| m).sum();

        let (cav_lo, cav_hi) = self.config.cavitation_band_hz;
        let (cav_sum, cav_count) = spectrum
            .bins_where(move |f| f >= cav_lo && f <= cav_hi)
            .fold((0.0, 0usize), |(sum, n), (_, m)| (sum + m, n + 1));
        let cavitation_level = if cav_count > 0 {
            cav_sum / cav_count as f64
        } else {
            0.0
        };

        tracing::debug!(
            peaks = peaks.len(),
            bpf_hz,
            centroid_hz = spectral_centroid_hz,
            cavitation = cavitation_level,
            "Extracted spectral features"
        );

        SpectralFeatures {
            status: FeatureStatus::Complete,
            peaks,
            bpf_hz,
            bpf_power,
            spectral_centroid_hz,
            kurtosis,
            energy_low,
            energy_mid,
            energy_high,
            cavitation_level,
        }
    }

    /// Strongest peak below the blade-pass ceiling; lowest frequency wins ties.
    fn blade_pass_candidate(&self, peaks: &[SpectralPeak]) -> (f64, f64) {
        peaks
            .iter()
            .filter(|p| p.frequency_hz < self.config.bpf_max_hz)
            .fold(None, |best: Option<&SpectralPeak>, p| match best {
                Some(b) if b.power >= p.power => Some(b),
                _ => Some(p),
            })
            .map(|p| (p.frequency_hz, p.power))
            .unwrap_or((0.0, 0.0))
    }
}

/// Magnitude-weighted mean frequency; 0 for a silent spectrum.
fn spectral_centroid(spectrum: &MagnitudeSpectrum) -> f64 {
    let total: f64 = spectrum.magnitudes.sum();
    if total <= 0.0 {
        return 0.0;
    }
    spectrum.frequencies.dot(&spectrum.magnitudes) / total
}

/// Fourth standardised moment `m4 / m2^2` of `values` taken as a sample.
fn kurtosis(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let (m2, m4) = values.iter().fold((0.0, 0.0), |(m2, m4), &v| {
        let d2 = (v - mean).powi(2);
        (m2 + d2, m4 + d2 * d2)
    });
    let m2 = m2 / n;
    let m4 = m4 / n;
    if m2 <= f64::EPSILON * f64::EPSILON {
        return 0.0;
    }
    m4 / (m2 * m2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn propeller_block(components: &[(f64, f64)], sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate;
                components
                    .iter()
                    .map(|&(f, a)| a * (2.0 * PI * f * t).sin())
                    .sum::<f64>()
                    * 0.5
            })
            .collect()
    }

    #[test]
    fn test_short_block_is_insufficient() {
        let extractor = FeatureExtractor::with_defaults();
        let samples = vec![1000i16; 511];
        let features = extractor.extract(AcousticBuffer::Pcm16(&samples)).unwrap();

        assert_eq!(features.status, FeatureStatus::InsufficientData);
        assert!(features.peaks.is_empty());
        assert_eq!(features, SpectralFeatures::insufficient());
    }

    #[test]
    fn test_minimum_block_is_processed() {
        let extractor = FeatureExtractor::with_defaults();
        let samples = propeller_block(&[(1500.0, 1.0)], 48_000.0, 512);
        let features = extractor.extract(AcousticBuffer::Double(&samples)).unwrap();

        assert!(features.is_complete());
        assert!(!features.peaks.is_empty());
    }

    #[test]
    fn test_boat_signature_features() {
        // 4800 samples at 48 kHz: 10 Hz bins, tones sit exactly on bins
        let extractor = FeatureExtractor::with_defaults();
        let samples = propeller_block(
            &[(100.0, 1.0), (200.0, 0.5), (300.0, 0.3), (15_000.0, 0.2)],
            48_000.0,
            4800,
        );
        let features = extractor.extract(AcousticBuffer::Double(&samples)).unwrap();

        assert!((features.bpf_hz - 100.0).abs() < 1e-9);
        assert!((features.bpf_power - 1.0).abs() < 1e-9);
        assert_eq!(features.harmonic_count(500.0), 3);

        let ranked = features.ranked_peaks(5);
        assert!((ranked[0].frequency_hz - 100.0).abs() < 1e-9);
        assert!(ranked.windows(2).all(|w| w[0].power >= w[1].power));

        // 15 kHz tone lands in the cavitation band and the high band
        assert!(features.cavitation_level > 0.0);
        assert!(features.energy_high > 0.0);
        assert!(features.energy_mid > features.energy_low);
    }

    #[test]
    fn test_no_bpf_above_ceiling() {
        let extractor = FeatureExtractor::with_defaults();
        let samples = propeller_block(&[(2000.0, 1.0)], 48_000.0, 4800);
        let features = extractor.extract(AcousticBuffer::Double(&samples)).unwrap();

        assert_eq!(features.bpf_hz, 0.0);
        assert_eq!(features.harmonic_count(500.0), 0);
        assert!((features.spectral_centroid_hz - 2000.0).abs() < 50.0);
    }

    #[test]
    fn test_silent_block_is_degenerate_but_finite() {
        let extractor = FeatureExtractor::with_defaults();
        let samples = vec![0i16; 1024];
        let features = extractor.extract(AcousticBuffer::Pcm16(&samples)).unwrap();

        assert!(features.is_complete());
        assert!(features.peaks.is_empty());
        assert_eq!(features.bpf_hz, 0.0);
        assert_eq!(features.spectral_centroid_hz, 0.0);
        assert_eq!(features.kurtosis, 0.0);
        assert_eq!(features.cavitation_level, 0.0);
    }

    #[test]
    fn test_empty_cavitation_band_at_low_rate() {
        // 8 kHz sampling: Nyquist 4 kHz, cavitation band unreachable
        let extractor = FeatureExtractor::with_defaults();
        let samples = propeller_block(&[(100.0, 1.0)], 8000.0, 800);
        let features = extractor
            .extract_at(AcousticBuffer::Double(&samples), 8000.0)
            .unwrap();
        assert_eq!(features.cavitation_level, 0.0);
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let extractor = FeatureExtractor::with_defaults();
        let mut samples = vec![0.0f32; 600];
        samples[10] = f32::NAN;
        assert!(matches!(
            extractor.extract(AcousticBuffer::Float(&samples)),
            Err(SignalError::DataValidation(_))
        ));
    }

    #[test]
    fn test_kurtosis_of_known_sample() {
        // Two-point symmetric distribution has kurtosis 1
        assert!((kurtosis(&[1.0, -1.0, 1.0, -1.0]) - 1.0).abs() < 1e-12);
        assert_eq!(kurtosis(&[0.5; 8]), 0.0);
        assert_eq!(kurtosis(&[]), 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(FeatureExtractor::new(FeatureExtractorConfig::default()).is_ok());

        let config = FeatureExtractorConfig::builder().sample_rate_hz(0.0).build();
        assert!(FeatureExtractor::new(config).is_err());

        let config = FeatureExtractorConfig::builder()
            .cavitation_band_hz(30_000.0, 5_000.0)
            .build();
        assert!(FeatureExtractor::new(config).is_err());
    }
}
