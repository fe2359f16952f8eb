//! Ordered, lossless merge of sample buffers.

use crate::error::{NarrateError, NarrateResult};
use crate::sample_buffer::SampleBuffer;
use tracing::debug;

/// Merge `buffers` into one buffer in input order
///
/// The output holds every input sample unchanged at its cumulative offset:
/// no resampling, gain change, or silence between segments.
///
/// # Errors
///
/// - `EmptyInput` if `buffers` is empty
/// - `FormatMismatch` naming the first buffer whose sample rate or channel
///   count differs from the first buffer's
pub fn concatenate<I>(buffers: I) -> NarrateResult<SampleBuffer>
where
    I: IntoIterator<Item = SampleBuffer>,
{
    let buffers: Vec<SampleBuffer> = buffers.into_iter().collect();
    let first = buffers.first().ok_or(NarrateError::EmptyInput)?;
    let (sample_rate, channels) = (first.sample_rate, first.channels);

    if let Some((index, odd)) = buffers
        .iter()
        .enumerate()
        .find(|(_, buffer)| !buffer.same_format(first))
    {
        return Err(NarrateError::format_mismatch(
            index,
            format!(
                "expected {sample_rate} Hz / {channels} ch, got {} Hz / {} ch",
                odd.sample_rate, odd.channels
            ),
        ));
    }

    let total: usize = buffers.iter().map(SampleBuffer::len).sum();
    let mut samples = Vec::with_capacity(total);
    for buffer in buffers {
        samples.extend_from_slice(&buffer.samples);
    }

    debug!("Concatenated {} samples at {} Hz", samples.len(), sample_rate);
    Ok(SampleBuffer {
        sample_rate,
        channels,
        samples,
    })
}
