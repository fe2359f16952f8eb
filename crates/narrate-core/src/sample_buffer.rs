//! In-memory mono PCM signal.

use std::time::Duration;

/// Audio data type - 32-bit floating point samples
pub type AudioData = Vec<f32>;

/// A mono signal at a fixed sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels; always 1 for buffers produced by capture
    pub channels: u16,
    /// Amplitudes, nominally in [-1.0, 1.0]
    pub samples: AudioData,
}

impl SampleBuffer {
    /// Create a mono buffer
    #[must_use]
    pub const fn mono(sample_rate: u32, samples: AudioData) -> Self {
        Self {
            sample_rate,
            channels: crate::DEFAULT_CHANNELS,
            samples,
        }
    }

    /// Zero-length mono buffer
    #[must_use]
    pub const fn empty(sample_rate: u32) -> Self {
        Self::mono(sample_rate, Vec::new())
    }

    /// Number of sample frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length at the buffer's rate
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Whether `other` can be appended without conversion
    #[must_use]
    pub const fn same_format(&self, other: &Self) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }
}
