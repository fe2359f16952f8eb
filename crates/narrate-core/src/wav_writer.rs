//! WAV container encoder
//!
//! Serializes a mono sample buffer as 16-bit PCM in a canonical 44-byte
//! RIFF/WAVE header, little-endian throughout.

use crate::error::{NarrateError, NarrateResult};
use crate::sample_buffer::SampleBuffer;
use std::io::Write;

/// Size of the canonical RIFF/WAVE header in bytes
pub const HEADER_LEN: usize = 44;

/// `audio format` value for integer PCM
const PCM_FORMAT: u16 = 1;
/// Size of the PCM `fmt ` chunk body
const FMT_CHUNK_LEN: u32 = 16;

/// WAV file format specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels
    pub channels: u16,
    /// Sample rate in Hz (e.g., 24000, 44100, 48000)
    pub sample_rate: u32,
    /// Bits per sample
    pub bit_depth: u16,
}

impl WavSpec {
    /// 16-bit mono PCM at `sample_rate`
    #[must_use]
    pub const fn pcm16_mono(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bit_depth: 16,
        }
    }

    /// Get bytes per sample
    const fn bytes_per_sample(&self) -> u16 {
        self.bit_depth / 8
    }

    /// Get byte rate (bytes per second), `None` if it overflows the header field
    const fn byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(self.block_align() as u32)
    }

    /// Get block align (bytes per sample frame)
    const fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }
}

/// Convert one float sample to 16-bit PCM
///
/// Clamps to [-1, 1], then scales negatives by 32768 and non-negatives by
/// 32767, truncating toward zero. NaN encodes as 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn quantize(sample: f32) -> i16 {
    let clamped = f64::from(sample).clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Encode `buffer` into an in-memory WAV file
///
/// # Errors
///
/// - `EmptyBuffer` if the buffer has no samples
/// - `InvalidInput` if the buffer is not mono or too long for a RIFF file
pub fn encode(buffer: &SampleBuffer) -> NarrateResult<Vec<u8>> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + buffer.len() * 2);
    write_wav(&mut bytes, buffer)?;
    Ok(bytes)
}

/// Stream `buffer` as a WAV file into `writer`
///
/// # Errors
///
/// Returns the same errors as [`encode`], plus `FileError` if `writer` fails.
pub fn write_wav<W: Write>(writer: &mut W, buffer: &SampleBuffer) -> NarrateResult<()> {
    if buffer.is_empty() {
        return Err(NarrateError::EmptyBuffer);
    }

    if buffer.channels != 1 {
        return Err(NarrateError::invalid_input(format!(
            "Only mono output is supported, got {} channels",
            buffer.channels
        )));
    }

    let spec = WavSpec::pcm16_mono(buffer.sample_rate);
    let byte_rate = spec.byte_rate().ok_or_else(|| {
        NarrateError::invalid_input(format!(
            "Sample rate {} Hz is too high for a 16-bit WAV header",
            buffer.sample_rate
        ))
    })?;
    let data_size = buffer
        .len()
        .checked_mul(usize::from(spec.block_align()))
        .and_then(|size| u32::try_from(size).ok())
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            NarrateError::invalid_input(format!(
                "{} samples exceed the 4 GiB RIFF size limit",
                buffer.len()
            ))
        })?;

    write_header(writer, &spec, byte_rate, data_size)?;
    for &sample in &buffer.samples {
        writer.write_all(&quantize(sample).to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write WAV/RIFF header (44 bytes)
fn write_header<W: Write>(
    writer: &mut W,
    spec: &WavSpec,
    byte_rate: u32,
    data_size: u32,
) -> NarrateResult<()> {
    // RIFF chunk
    writer.write_all(b"RIFF")?;
    writer.write_all(&(36 + data_size).to_le_bytes())?; // File size - 8
    writer.write_all(b"WAVE")?;

    // fmt chunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&FMT_CHUNK_LEN.to_le_bytes())?;
    writer.write_all(&PCM_FORMAT.to_le_bytes())?;
    writer.write_all(&spec.channels.to_le_bytes())?;
    writer.write_all(&spec.sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&spec.block_align().to_le_bytes())?;
    writer.write_all(&spec.bit_depth.to_le_bytes())?;

    // data chunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    Ok(())
}
