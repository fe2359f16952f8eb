//! Voice catalog snapshots and voice selection for synthesis.

use crate::error::{NarrateError, NarrateResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A voice offered by the speech engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voice {
    /// Unique identifier for the voice
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Language code (e.g., "en-US", "es-ES")
    pub language: String,
    /// Whether the engine marks this voice as its default
    pub is_default: bool,
}

impl Voice {
    /// Create a new voice entry
    #[must_use]
    pub fn new<I: Into<String>, N: Into<String>, L: Into<String>>(id: I, name: N, language: L) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
            is_default: false,
        }
    }

    /// Mark the voice as the engine default
    #[must_use]
    pub const fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Immutable snapshot of the engine's voice list
///
/// The list is queried once per compile run and then only read, so a
/// catalog change during a long compile cannot swap voices mid-run.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Arc<[Voice]>,
}

impl VoiceCatalog {
    /// Create a catalog from the engine's voice list, preserving its order
    #[must_use]
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices: voices.into(),
        }
    }

    /// All voices in engine order
    #[must_use]
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Get a specific voice by ID
    ///
    /// # Errors
    ///
    /// Returns an error if no voice has this ID.
    pub fn get_voice(&self, voice_id: &str) -> NarrateResult<&Voice> {
        self.voices
            .iter()
            .find(|voice| voice.id == voice_id)
            .ok_or_else(|| NarrateError::voice_not_found(voice_id))
    }

    /// Get a voice by its position in the engine list
    #[must_use]
    pub fn by_index(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    /// Resolve a selection by voice ID, falling back to a list index
    ///
    /// # Errors
    ///
    /// Returns an error if the selection matches neither an ID nor an index.
    pub fn resolve(&self, selection: &str) -> NarrateResult<&Voice> {
        self.get_voice(selection).or_else(|err| {
            selection
                .parse::<usize>()
                .ok()
                .and_then(|index| self.by_index(index))
                .ok_or(err)
        })
    }

    /// The engine default voice, or the first voice
    #[must_use]
    pub fn default_voice(&self) -> Option<&Voice> {
        self.voices
            .iter()
            .find(|voice| voice.is_default)
            .or_else(|| self.voices.first())
    }

    /// Number of voices
    #[must_use]
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether the engine offered no voices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
