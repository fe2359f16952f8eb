//! Speech engine and recorder seams.
//!
//! The platform speech synthesizer and the device that records its output
//! are process-wide resources owned outside this crate. They are reached only
//! through [`SpeechEngine`] and [`AudioRecorder`], so a deterministic fake can
//! stand in for both in tests.

use crate::error::{NarrateError, NarrateResult};
use crate::voice_manager::Voice;
use async_trait::async_trait;

/// Lowest speaking rate accepted by engines
pub const MIN_RATE: f32 = 0.1;
/// Highest speaking rate accepted by engines
pub const MAX_RATE: f32 = 10.0;

/// Voice and rate used for every item of a compile run
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    /// Voice resolved from the catalog snapshot
    pub voice: Voice,
    /// Speaking rate multiplier (1.0 = normal speed)
    pub rate: f32,
}

impl SynthesisParams {
    /// Create new synthesis parameters at normal rate
    #[must_use]
    pub const fn new(voice: Voice) -> Self {
        Self { voice, rate: 1.0 }
    }

    /// Set the speaking rate
    ///
    /// # Errors
    ///
    /// Returns an error if rate is not in valid range (0.1 to 10.0)
    pub fn with_rate(mut self, rate: f32) -> NarrateResult<Self> {
        validate_rate(rate)?;
        self.rate = rate;
        Ok(self)
    }

    /// Validate synthesis parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the voice ID is empty or the rate is out of range.
    pub fn validate(&self) -> NarrateResult<()> {
        if self.voice.id.is_empty() {
            return Err(NarrateError::invalid_input("Voice ID cannot be empty"));
        }
        validate_rate(self.rate)
    }

    /// Build the utterance for one text
    #[must_use]
    pub fn utterance<S: Into<String>>(&self, text: S) -> Utterance {
        Utterance {
            text: text.into(),
            voice_id: self.voice.id.clone(),
            rate: self.rate,
        }
    }
}

/// Check a speaking rate against the engine range
///
/// # Errors
///
/// Returns an error if the rate is not finite or outside 0.1 to 10.0.
pub fn validate_rate(rate: f32) -> NarrateResult<()> {
    if !(MIN_RATE..=MAX_RATE).contains(&rate) {
        return Err(NarrateError::invalid_input(format!(
            "Rate must be between {MIN_RATE} and {MAX_RATE}, got {rate}"
        )));
    }
    Ok(())
}

/// One synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Text to speak
    pub text: String,
    /// Engine voice identifier
    pub voice_id: String,
    /// Speaking rate multiplier
    pub rate: f32,
}

/// Text-to-speech engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Current voice list; queried once per compile run
    async fn voices(&self) -> NarrateResult<Vec<Voice>>;

    /// Speak `utterance`, resolving when the engine signals the end of it
    ///
    /// # Errors
    ///
    /// Returns `SynthesisFailure` if the engine reports an error.
    async fn speak(&self, utterance: &Utterance) -> NarrateResult<()>;

    /// Abort any utterance in flight
    async fn cancel(&self);
}

/// Recorder attached to the engine's audio output
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioRecorder: Send + Sync {
    /// Native sample rate of the capture device in Hz
    fn sample_rate(&self) -> u32;

    /// Begin recording into an in-memory sink
    ///
    /// # Errors
    ///
    /// Returns an error if the recording graph cannot be set up.
    async fn start(&self) -> NarrateResult<()>;

    /// Stop recording, resolving once buffered audio has been flushed
    ///
    /// Returns the finalized recording as a RIFF/WAVE byte stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorder fails to finalize.
    async fn stop(&self) -> NarrateResult<Vec<u8>>;

    /// Close and disconnect the transient nodes of the last session
    ///
    /// Safe to call whether or not a session is active.
    async fn release(&self);
}
