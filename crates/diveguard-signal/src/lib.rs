//! DiveGuard Signal Processing Library
//!
//! This crate turns raw hydrophone buffers into the scalar descriptors used to
//! recognise propeller signatures: blade-pass frequency candidates, spectral
//! centroid, kurtosis, band energies and cavitation-band energy.
//!
//! # Features
//!
//! - **PCM handling**: Signed 16-bit or floating-point mono buffers, normalised to [-1, 1]
//! - **Spectrum**: Hann-windowed real FFT magnitude, normalised to its maximum
//! - **Peak picking**: Height / distance / prominence selection compatible with
//!   the classic `find_peaks` semantics
//! - **Spectral features**: Centroid, kurtosis, band energies, cavitation level
//!
//! # Example
//!
//! ```rust
//! use diveguard_signal::{AcousticBuffer, FeatureExtractor, FeatureExtractorConfig, FeatureStatus};
//!
//! # fn main() -> diveguard_signal::Result<()> {
//! let samples: Vec<f32> = (0..4800)
//!     .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 48_000.0).sin())
//!     .collect();
//!
//! let config = FeatureExtractorConfig::builder().sample_rate_hz(48_000.0).build();
//! let extractor = FeatureExtractor::new(config)?;
//! let features = extractor.extract(AcousticBuffer::Float(&samples))?;
//!
//! assert_eq!(features.status, FeatureStatus::Complete);
//! assert!((features.bpf_hz - 100.0).abs() < 10.0);
//! # Ok(())
//! # }
//! ```

pub mod features;
pub mod pcm;
pub mod peaks;
pub mod spectrum;

pub use features::{
    FeatureExtractor, FeatureExtractorConfig, FeatureExtractorConfigBuilder, FeatureStatus,
    SpectralFeatures,
};
pub use pcm::AcousticBuffer;
pub use peaks::{find_peaks, PeakConfig, SpectralPeak};
pub use spectrum::{hann_window, MagnitudeSpectrum};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for signal processing operations
pub type Result<T> = std::result::Result<T, SignalError>;

/// Unified error type for signal processing operations
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sample rate is zero, negative or not finite
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Data validation error
    #[error("Data validation error: {0}")]
    DataValidation(String),
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::features::{FeatureExtractor, FeatureStatus, SpectralFeatures};
    pub use crate::pcm::AcousticBuffer;
    pub use crate::peaks::SpectralPeak;
    pub use crate::{Result, SignalError};
}
