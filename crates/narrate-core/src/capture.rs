//! One synthesis + record + decode cycle per text.
//!
//! A capture session waits on three things in order: the engine's
//! end-of-utterance signal, the recorder's finalize after stop, and the
//! decode of the recorded bytes. Recording is never stopped before synthesis
//! has ended, and decode never starts before the recorder has flushed.

use crate::audio_device::DeviceLease;
use crate::cancel::CancelSignal;
use crate::config::CompileConfig;
use crate::error::{NarrateError, NarrateResult};
use crate::sample_buffer::{AudioData, SampleBuffer};
use crate::tts_engine::{AudioRecorder, SpeechEngine, SynthesisParams, Utterance};
use hound::SampleFormat;
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Speech Capture Unit driving one engine/recorder pair
pub struct SpeechCapture {
    engine: Arc<dyn SpeechEngine>,
    recorder: Arc<dyn AudioRecorder>,
    capture_timeout: Duration,
    finalize_timeout: Duration,
}

impl std::fmt::Debug for SpeechCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCapture")
            .field("capture_timeout", &self.capture_timeout)
            .field("finalize_timeout", &self.finalize_timeout)
            .finish_non_exhaustive()
    }
}

impl SpeechCapture {
    /// Create a capture unit with the timeouts from `config`
    #[must_use]
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        recorder: Arc<dyn AudioRecorder>,
        config: &CompileConfig,
    ) -> Self {
        Self {
            engine,
            recorder,
            capture_timeout: config.capture_timeout,
            finalize_timeout: config.finalize_timeout,
        }
    }

    /// Create a capture unit over a leased device
    #[must_use]
    pub fn from_lease(lease: &DeviceLease, config: &CompileConfig) -> Self {
        Self::new(lease.engine(), lease.recorder(), config)
    }

    /// Synthesize `text`, record it, and decode the recording
    ///
    /// Empty or whitespace-only text yields a zero-length buffer at the
    /// recorder's native rate without invoking the engine. The recorder's
    /// session resources are released on every exit path.
    ///
    /// # Errors
    ///
    /// - `SynthesisFailure` if the engine reports an error
    /// - `CaptureTimeout` if recorder start, synthesis or finalize exceeds
    ///   its bounded wait
    /// - `Cancelled` if `cancel` fires during the session
    /// - `DecodeFailure` if the recording is not a readable RIFF/WAVE stream
    ///   or is not at the recorder's native rate
    pub async fn capture(
        &self,
        text: &str,
        params: &SynthesisParams,
        cancel: &CancelSignal,
    ) -> NarrateResult<SampleBuffer> {
        if text.trim().is_empty() {
            debug!("Empty text, skipping synthesis");
            return Ok(SampleBuffer::empty(self.recorder.sample_rate()));
        }

        if cancel.is_cancelled() {
            return Err(NarrateError::Cancelled);
        }

        let outcome = self.run_session(params.utterance(text), cancel).await;
        self.recorder.release().await;
        outcome
    }

    async fn run_session(
        &self,
        utterance: Utterance,
        cancel: &CancelSignal,
    ) -> NarrateResult<SampleBuffer> {
        debug!(
            "Capturing {} characters with voice '{}' at rate {}",
            utterance.text.chars().count(),
            utterance.voice_id,
            utterance.rate
        );

        bounded(
            cancel,
            self.finalize_timeout,
            "recorder did not start",
            self.recorder.start(),
        )
        .await?;

        let synthesis = bounded(
            cancel,
            self.capture_timeout,
            "no synthesis-end signal",
            self.engine.speak(&utterance),
        )
        .await;
        if let Err(err) = synthesis {
            warn!("Synthesis did not complete ({}), cancelling utterance", err);
            self.engine.cancel().await;
            return Err(err);
        }

        let recording = bounded(
            cancel,
            self.finalize_timeout,
            "recorder did not finalize",
            self.recorder.stop(),
        )
        .await?;
        debug!("Recorder finalized {} bytes", recording.len());

        let buffer = tokio::task::spawn_blocking(move || decode_recording(&recording))
            .await
            .map_err(|e| NarrateError::decode(format!("Decode task failed: {e}")))??;

        let native_rate = self.recorder.sample_rate();
        if buffer.sample_rate != native_rate {
            return Err(NarrateError::decode(format!(
                "recording is {} Hz, capture device runs at {} Hz",
                buffer.sample_rate, native_rate
            )));
        }

        debug!(
            "Captured {} samples at {} Hz ({:?})",
            buffer.len(),
            buffer.sample_rate,
            buffer.duration()
        );
        Ok(buffer)
    }
}

/// Await `operation` for at most `limit`, giving up early if `cancel` fires
///
/// A timeout becomes `CaptureTimeout` with `"{what} within {limit}"`.
pub(crate) async fn bounded<T, F>(
    cancel: &CancelSignal,
    limit: Duration,
    what: &str,
    operation: F,
) -> NarrateResult<T>
where
    F: Future<Output = NarrateResult<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(NarrateError::Cancelled),
        result = tokio::time::timeout(limit, operation) => {
            result.unwrap_or_else(|_| {
                Err(NarrateError::capture_timeout(format!("{what} within {limit:?}")))
            })
        }
    }
}

/// Decode a finalized RIFF/WAVE recording into a mono buffer
///
/// Integer PCM is scaled by `1 / 2^(bits - 1)`, float PCM is taken as is.
/// Multi-channel recordings keep channel 0.
///
/// # Errors
///
/// Returns `DecodeFailure` if the bytes are not a readable WAV stream.
pub fn decode_recording(bytes: &[u8]) -> NarrateResult<SampleBuffer> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(NarrateError::decode("recording declares a 0 Hz sample rate"));
    }
    let channels = usize::from(spec.channels.max(1));

    let samples: AudioData = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            #[allow(clippy::cast_precision_loss)]
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(SampleBuffer::mono(spec.sample_rate, samples))
}
