//! Deterministic in-process speech device for integration tests.
//!
//! The fake engine "renders" a sample pattern per utterance straight into the
//! fake recorder's sink, so captures are reproducible and exact.

#![allow(dead_code)]

use async_trait::async_trait;
use narrate_core::{
    AudioRecorder, CompileConfig, Compiler, MarkupCleaner, NarrateError, NarrateResult,
    SpeechDevice, SpeechEngine, Utterance, Voice,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// How the fake engine responds to one text
#[derive(Debug, Clone)]
pub enum Script {
    /// Render this many samples
    Samples(usize),
    /// Render this many samples, recorded at a different rate
    SamplesAt(usize, u32),
    /// Never signal end of utterance
    Stall,
    /// Report a synthesis error
    Fail(String),
}

#[derive(Debug, Default)]
struct Shared {
    recording: bool,
    sink: Vec<f32>,
    sink_rate: Option<u32>,
    spoken: Vec<Utterance>,
    cancels: usize,
    releases: usize,
}

/// Fake engine and recorder wired to one shared sink
#[derive(Clone)]
pub struct FakeDevice {
    shared: Arc<Mutex<Shared>>,
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    sample_rate: u32,
    stall_start: bool,
    stall_voices: bool,
}

impl FakeDevice {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            shared: Arc::default(),
            scripts: Arc::default(),
            sample_rate,
            stall_start: false,
            stall_voices: false,
        }
    }

    /// Recorder start never completes
    pub fn stalling_start(mut self) -> Self {
        self.stall_start = true;
        self
    }

    /// Engine never answers the voice query
    pub fn stalling_voices(mut self) -> Self {
        self.stall_voices = true;
        self
    }

    pub fn script(self, text: &str, script: Script) -> Self {
        self.scripts.lock().insert(text.to_string(), script);
        self
    }

    pub fn device(&self) -> SpeechDevice {
        SpeechDevice::new(
            Arc::new(FakeEngine(self.clone())),
            Arc::new(FakeRecorder(self.clone())),
        )
    }

    pub fn compiler(&self) -> Compiler {
        self.compiler_with(fast_config())
    }

    pub fn compiler_with(&self, config: CompileConfig) -> Compiler {
        Compiler::with_config(self.device(), Arc::new(MarkupCleaner::new().unwrap()), config)
            .unwrap()
    }

    /// Texts the engine was asked to speak, in order
    pub fn spoken(&self) -> Vec<String> {
        self.shared.lock().spoken.iter().map(|u| u.text.clone()).collect()
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.shared.lock().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.shared.lock().cancels
    }

    pub fn releases(&self) -> usize {
        self.shared.lock().releases
    }
}

/// Short timeouts so stalled captures fail quickly
pub fn fast_config() -> CompileConfig {
    CompileConfig::default()
        .with_capture_timeout(Duration::from_millis(200))
        .with_finalize_timeout(Duration::from_millis(200))
}

pub fn voices() -> Vec<Voice> {
    vec![
        Voice::new("en-US-1", "Ava", "en-US").as_default(),
        Voice::new("en-GB-1", "Oliver", "en-GB"),
        Voice::new("fr-FR-1", "Amelie", "fr-FR"),
    ]
}

/// Samples rendered for `text`; exactly representable in 16-bit PCM
pub fn pattern(text: &str, len: usize) -> Vec<f32> {
    let seed = text.bytes().map(usize::from).sum::<usize>();
    (0..len)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let step = ((i + seed) % 512) as f32 - 256.0;
            step / 512.0
        })
        .collect()
}

/// Default sample count: 100 samples per character
pub fn default_len(text: &str) -> usize {
    text.chars().count() * 100
}

struct FakeEngine(FakeDevice);

#[async_trait]
impl SpeechEngine for FakeEngine {
    async fn voices(&self) -> NarrateResult<Vec<Voice>> {
        if self.0.stall_voices {
            return std::future::pending().await;
        }
        Ok(voices())
    }

    async fn speak(&self, utterance: &Utterance) -> NarrateResult<()> {
        let script = self.0.scripts.lock().get(&utterance.text).cloned();
        {
            let mut shared = self.0.shared.lock();
            shared.spoken.push(utterance.clone());
            if !shared.recording {
                return Err(NarrateError::synthesis("spoke while not recording"));
            }
        }

        let (len, rate) = match script {
            None => (default_len(&utterance.text), None),
            Some(Script::Samples(len)) => (len, None),
            Some(Script::SamplesAt(len, rate)) => (len, Some(rate)),
            Some(Script::Stall) => return std::future::pending().await,
            Some(Script::Fail(message)) => return Err(NarrateError::synthesis(message)),
        };

        tokio::task::yield_now().await;
        let mut shared = self.0.shared.lock();
        shared.sink.extend(pattern(&utterance.text, len));
        shared.sink_rate = rate;
        Ok(())
    }

    async fn cancel(&self) {
        self.0.shared.lock().cancels += 1;
    }
}

struct FakeRecorder(FakeDevice);

#[async_trait]
impl AudioRecorder for FakeRecorder {
    fn sample_rate(&self) -> u32 {
        self.0.sample_rate
    }

    async fn start(&self) -> NarrateResult<()> {
        if self.0.stall_start {
            return std::future::pending().await;
        }
        let mut shared = self.0.shared.lock();
        if shared.recording {
            return Err(NarrateError::synthesis("recorder already started"));
        }
        shared.recording = true;
        shared.sink.clear();
        shared.sink_rate = None;
        Ok(())
    }

    async fn stop(&self) -> NarrateResult<Vec<u8>> {
        let (samples, rate) = {
            let mut shared = self.0.shared.lock();
            shared.recording = false;
            (
                std::mem::take(&mut shared.sink),
                shared.sink_rate.take().unwrap_or(self.0.sample_rate),
            )
        };
        Ok(riff_float(&samples, rate))
    }

    async fn release(&self) {
        let mut shared = self.0.shared.lock();
        shared.recording = false;
        shared.releases += 1;
    }
}

/// 32-bit float mono WAV, the format browser recorders finalize to
pub fn riff_float(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}
