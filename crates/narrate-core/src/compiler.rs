//! Compilation Orchestrator: queue in, one WAV file out.
//!
//! Items are captured strictly one after another on a leased device, then
//! concatenated and encoded once. Any failure aborts the run and no file is
//! produced.

use crate::audio_device::{LeasePurpose, SpeechDevice};
use crate::audio_writer::{AudioWriter, EncodedFile};
use crate::cancel::CancelSignal;
use crate::capture::{bounded, SpeechCapture};
use crate::concat::concatenate;
use crate::config::CompileConfig;
use crate::error::{NarrateError, NarrateResult};
use crate::extractor::TextExtractor;
use crate::queue::{Queue, QueueItem, SourceKind};
use crate::tts_engine::{validate_rate, SynthesisParams};
use crate::voice_manager::{Voice, VoiceCatalog};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives a compile run over a speech device
pub struct Compiler {
    device: SpeechDevice,
    extractor: Arc<dyn TextExtractor>,
    config: CompileConfig,
    writer: AudioWriter,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("device", &self.device)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Compiler {
    /// Create a compiler with the default configuration
    #[must_use]
    pub fn new(device: SpeechDevice, extractor: Arc<dyn TextExtractor>) -> Self {
        let config = CompileConfig::default();
        let writer = AudioWriter::with_file_name(config.output_file_name.clone());
        Self {
            device,
            extractor,
            config,
            writer,
        }
    }

    /// Create a compiler with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(
        device: SpeechDevice,
        extractor: Arc<dyn TextExtractor>,
        config: CompileConfig,
    ) -> NarrateResult<Self> {
        config.validate()?;
        let writer = AudioWriter::with_file_name(config.output_file_name.clone());
        Ok(Self {
            device,
            extractor,
            config,
            writer,
        })
    }

    /// Get compiler configuration
    #[must_use]
    pub const fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Writer used for encoding and saving compiled files
    #[must_use]
    pub const fn writer(&self) -> &AudioWriter {
        &self.writer
    }

    /// The device this compiler drives
    #[must_use]
    pub const fn device(&self) -> &SpeechDevice {
        &self.device
    }

    /// Compile a snapshot of `queue`
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    pub async fn compile_queue(
        &self,
        queue: &Queue,
        voice_id: &str,
        rate: f32,
    ) -> NarrateResult<EncodedFile> {
        self.compile(queue.snapshot(), voice_id, rate).await
    }

    /// Compile `queue` into one WAV file
    ///
    /// An empty `voice_id` selects the engine's default voice; otherwise it
    /// is matched against voice IDs, then list indices.
    ///
    /// # Errors
    ///
    /// - `EmptyQueue` if `queue` is empty
    /// - `InvalidInput` if `rate` is out of range
    /// - `DeviceBusy` if another client holds the device
    /// - `VoiceNotFound` if `voice_id` matches no catalog voice
    /// - `CaptureTimeout` if the engine does not list its voices in time
    /// - `ItemFailed` wrapping the unmodified capture, extraction or
    ///   concatenation error of the offending item
    /// - `EmptyBuffer` if every item produced silence
    pub async fn compile(
        &self,
        queue: Vec<QueueItem>,
        voice_id: &str,
        rate: f32,
    ) -> NarrateResult<EncodedFile> {
        self.compile_with_cancel(queue, voice_id, rate, CancelSignal::never())
            .await
    }

    /// Compile `queue`, stopping early when `cancel` fires
    ///
    /// On cancellation no further synthesis is issued, the in-flight capture
    /// is cancelled and released, partial buffers are discarded, and
    /// `Cancelled` is returned.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`], plus `Cancelled`.
    pub async fn compile_with_cancel(
        &self,
        queue: Vec<QueueItem>,
        voice_id: &str,
        rate: f32,
        cancel: CancelSignal,
    ) -> NarrateResult<EncodedFile> {
        if queue.is_empty() {
            return Err(NarrateError::EmptyQueue);
        }
        validate_rate(rate)?;

        let started = Instant::now();
        let lease = self.device.try_acquire(LeasePurpose::Compile)?;

        let engine = lease.engine();
        let voices = bounded(
            &cancel,
            self.config.finalize_timeout,
            "engine did not list its voices",
            engine.voices(),
        )
        .await?;
        let catalog = VoiceCatalog::new(voices);
        let voice = select_voice(&catalog, voice_id)?;
        let params = SynthesisParams::new(voice).with_rate(rate)?;
        let capture = SpeechCapture::from_lease(&lease, &self.config);

        info!(
            "Compiling {} queue items with voice '{}' at rate {}",
            queue.len(),
            params.voice.id,
            params.rate
        );

        let mut buffers = Vec::with_capacity(queue.len());
        for (index, item) in queue.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Compile cancelled before item {}", index);
                return Err(NarrateError::Cancelled);
            }

            let text = self.resolve_text(item).map_err(|e| tag(e, index, item))?;
            debug!(
                "Item {} '{}': {} characters to synthesize",
                index,
                item.display_name,
                text.chars().count()
            );

            let buffer = capture
                .capture(&text, &params, &cancel)
                .await
                .map_err(|e| tag(e, index, item))?;
            buffers.push(buffer);
        }

        let compiled = concatenate(buffers).map_err(|err| match err {
            NarrateError::FormatMismatch { index, .. } => match queue.get(index) {
                Some(item) => tag(err, index, item),
                None => err,
            },
            other => other,
        })?;

        let file = self.writer.encode(&compiled)?;
        drop(lease);

        info!(
            "Compiled {:?} of audio from {} items in {:?}",
            compiled.duration(),
            queue.len(),
            started.elapsed()
        );
        Ok(file)
    }

    /// Text to synthesize for one item
    fn resolve_text(&self, item: &QueueItem) -> NarrateResult<String> {
        let text = match item.source {
            SourceKind::Text => item.raw_content.clone(),
            SourceKind::Document => self.extractor.extract(&item.raw_content, item.profile),
        };

        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(NarrateError::invalid_input(format!(
                "Text length {} exceeds maximum of {} characters",
                length, self.config.max_text_length
            )));
        }

        Ok(text)
    }
}

fn select_voice(catalog: &VoiceCatalog, voice_id: &str) -> NarrateResult<Voice> {
    if voice_id.is_empty() {
        return catalog
            .default_voice()
            .cloned()
            .ok_or_else(|| NarrateError::voice_not_found("<default>"));
    }
    catalog.resolve(voice_id).cloned()
}

fn tag(err: NarrateError, index: usize, item: &QueueItem) -> NarrateError {
    if err == NarrateError::Cancelled {
        return err;
    }
    warn!("Queue item {} '{}' failed: {}", index, item.display_name, err);
    err.for_item(index, item.id, item.display_name.clone())
}
