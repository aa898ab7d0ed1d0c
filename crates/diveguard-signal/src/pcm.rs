//! Hydrophone PCM buffers.

/// Borrowed mono PCM buffer as delivered by the hydrophone driver.
///
/// Signed 16-bit samples are scaled by 1/32768 into [-1, 1). Floating-point
/// samples are taken to be full-scale already and pass through unchanged.
#[derive(Debug, Clone, Copy)]
pub enum AcousticBuffer<'a> {
    /// Signed 16-bit PCM
    Pcm16(&'a [i16]),
    /// Single-precision float PCM
    Float(&'a [f32]),
    /// Double-precision float PCM
    Double(&'a [f64]),
}

impl<'a> AcousticBuffer<'a> {
    /// Number of samples in the buffer
    pub fn len(&self) -> usize {
        match self {
            AcousticBuffer::Pcm16(s) => s.len(),
            AcousticBuffer::Float(s) => s.len(),
            AcousticBuffer::Double(s) => s.len(),
        }
    }

    /// True when the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalise to `f64` samples in [-1, 1].
    pub fn to_normalized(&self) -> Vec<f64> {
        match self {
            AcousticBuffer::Pcm16(s) => s.iter().map(|&v| f64::from(v) / 32768.0).collect(),
            AcousticBuffer::Float(s) => s.iter().map(|&v| f64::from(v)).collect(),
            AcousticBuffer::Double(s) => s.to_vec(),
        }
    }
}

impl<'a> From<&'a [i16]> for AcousticBuffer<'a> {
    fn from(samples: &'a [i16]) -> Self {
        AcousticBuffer::Pcm16(samples)
    }
}

impl<'a> From<&'a [f32]> for AcousticBuffer<'a> {
    fn from(samples: &'a [f32]) -> Self {
        AcousticBuffer::Float(samples)
    }
}

impl<'a> From<&'a [f64]> for AcousticBuffer<'a> {
    fn from(samples: &'a [f64]) -> Self {
        AcousticBuffer::Double(samples)
    }
}
