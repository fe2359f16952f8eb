//! # Narrate Core
//!
//! Compiles a queue of texts into a single narrated WAV file by driving a
//! speech engine, capturing what it renders, and stitching the captures
//! together.
//!
//! ## Features
//!
//! - Ordered queue of typed text and uploaded documents
//! - Markup cleaning with regular and site-specific profiles
//! - Sequential, time-bounded speech capture over an exclusive device
//! - Lossless concatenation and canonical 16-bit PCM WAV encoding
//! - Per-item error attribution and cooperative cancellation
//!
//! ## Example
//!
//! ```rust,no_run
//! use narrate_core::{Compiler, MarkupCleaner, Queue, SpeechDevice};
//! use std::sync::Arc;
//!
//! # async fn run(device: SpeechDevice) -> anyhow::Result<()> {
//! let mut queue = Queue::new();
//! queue.add_text("Chapter one.");
//! queue.add_documents(&["chapter-two.html"]).await?;
//!
//! let compiler = Compiler::new(device, Arc::new(MarkupCleaner::new()?));
//! let file = compiler.compile_queue(&queue, "", 1.0).await?;
//! compiler.writer().save(&file, "out").await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(missing_docs))]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod audio_device;
pub mod audio_writer;
pub mod cancel;
pub mod capture;
pub mod compiler;
pub mod concat;
pub mod config;
pub mod error;
pub mod extractor;
pub mod queue;
pub mod sample_buffer;
pub mod tts_engine;
pub mod voice_manager;
pub mod wav_writer;

// Re-export main types for convenience
pub use audio_device::{DeviceLease, DeviceState, LeasePurpose, SpeechDevice};
pub use audio_writer::{AudioWriter, EncodedFile};
pub use cancel::{cancellation, CancelSignal, Canceller};
pub use capture::SpeechCapture;
pub use compiler::Compiler;
pub use concat::concatenate;
pub use config::CompileConfig;
pub use error::{NarrateError, NarrateResult};
pub use extractor::{Extraction, MarkupCleaner, TextExtractor};
pub use queue::{CleaningProfile, Queue, QueueItem, SourceKind};
pub use sample_buffer::{AudioData, SampleBuffer};
pub use tts_engine::{AudioRecorder, SpeechEngine, SynthesisParams, Utterance};
pub use voice_manager::{Voice, VoiceCatalog};

/// Version information for the narrate-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Typical capture rate of browser-hosted recorders (24 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Default number of audio channels (mono)
pub const DEFAULT_CHANNELS: u16 = 1;

/// Maximum text length for one queue item
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// Download name of the compiled file
pub const DEFAULT_FILE_NAME: &str = "compiled_audio.wav";
