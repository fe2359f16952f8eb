//! Error types for the Narrate compilation pipeline.

use uuid::Uuid;

/// Result type alias for Narrate operations
pub type NarrateResult<T> = Result<T, NarrateError>;

/// Main error type for Narrate compile operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrateError {
    /// The queue handed to the compiler had no items
    #[error("Queue is empty: nothing to compile")]
    EmptyQueue,

    /// The concatenator was given no buffers
    #[error("No sample buffers to concatenate")]
    EmptyInput,

    /// The encoder was given a buffer without samples
    #[error("Sample buffer is empty: nothing to encode")]
    EmptyBuffer,

    /// The speech engine reported an error
    #[error("Speech synthesis failed: {message}")]
    SynthesisFailure {
        /// Error message reported by the engine
        message: String,
    },

    /// A capture session did not complete within its bounded wait
    #[error("Capture timed out: {message}")]
    CaptureTimeout {
        /// Which wait expired and for how long
        message: String,
    },

    /// Buffers with different sample rates or channel counts reached the concatenator
    #[error("Sample format mismatch at buffer {index}: {message}")]
    FormatMismatch {
        /// Position of the offending buffer in the concatenation input
        index: usize,
        /// Description of the mismatch
        message: String,
    },

    /// Recorded audio could not be decoded
    #[error("Failed to decode captured audio: {message}")]
    DecodeFailure {
        /// Error message describing the decode failure
        message: String,
    },

    /// The speech device is leased to another client
    #[error("Speech device busy: {message}")]
    DeviceBusy {
        /// Error message describing the current holder
        message: String,
    },

    /// The caller aborted the compile run
    #[error("Compilation cancelled")]
    Cancelled,

    /// Voice not found in the engine catalog
    #[error("Voice '{voice_id}' not found")]
    VoiceNotFound {
        /// The voice ID that was not found
        voice_id: String,
    },

    /// Invalid input error
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the invalid input
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Error message describing the configuration issue
        message: String,
    },

    /// File I/O error
    #[error("File I/O error: {message}")]
    FileError {
        /// Error message describing the file operation failure
        message: String,
    },

    /// A stage failed while processing one queue item
    #[error("Queue item {index} ('{display_name}') failed: {source}")]
    ItemFailed {
        /// Position of the item in the compiled queue
        index: usize,
        /// Identity of the failing item
        item_id: Uuid,
        /// Display name of the failing item
        display_name: String,
        /// The unmodified downstream error
        source: Box<NarrateError>,
    },
}

impl NarrateError {
    /// Create a new synthesis failure
    #[must_use]
    pub fn synthesis<S: Into<String>>(message: S) -> Self {
        Self::SynthesisFailure {
            message: message.into(),
        }
    }

    /// Create a new capture timeout
    #[must_use]
    pub fn capture_timeout<S: Into<String>>(message: S) -> Self {
        Self::CaptureTimeout {
            message: message.into(),
        }
    }

    /// Create a new format mismatch for the buffer at `index`
    #[must_use]
    pub fn format_mismatch<S: Into<String>>(index: usize, message: S) -> Self {
        Self::FormatMismatch {
            index,
            message: message.into(),
        }
    }

    /// Create a new decode failure
    #[must_use]
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::DecodeFailure {
            message: message.into(),
        }
    }

    /// Create a new device busy error
    #[must_use]
    pub fn device_busy<S: Into<String>>(message: S) -> Self {
        Self::DeviceBusy {
            message: message.into(),
        }
    }

    /// Create a new voice not found error
    #[must_use]
    pub fn voice_not_found<S: Into<String>>(voice_id: S) -> Self {
        Self::VoiceNotFound {
            voice_id: voice_id.into(),
        }
    }

    /// Create a new invalid input error
    #[must_use]
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new file error
    #[must_use]
    pub fn file<S: Into<String>>(message: S) -> Self {
        Self::FileError {
            message: message.into(),
        }
    }

    /// Tag an error with the queue item it happened on
    #[must_use]
    pub fn for_item<S: Into<String>>(self, index: usize, item_id: Uuid, display_name: S) -> Self {
        Self::ItemFailed {
            index,
            item_id,
            display_name: display_name.into(),
            source: Box::new(self),
        }
    }

    /// The error with any item tagging stripped off
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::ItemFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Identity of the queue item this error is tagged with, if any
    #[must_use]
    pub const fn item_id(&self) -> Option<Uuid> {
        match self {
            Self::ItemFailed { item_id, .. } => Some(*item_id),
            _ => None,
        }
    }

    /// Queue position of the item this error is tagged with, if any
    #[must_use]
    pub const fn item_index(&self) -> Option<usize> {
        match self {
            Self::ItemFailed { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Check if this error is due to invalid user input
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::EmptyQueue
                | Self::InvalidInput { .. }
                | Self::VoiceNotFound { .. }
                | Self::ConfigurationError { .. }
        )
    }

    /// Get the error category for logging
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self.root_cause() {
            Self::EmptyQueue => "empty_queue",
            Self::EmptyInput => "empty_input",
            Self::EmptyBuffer => "empty_buffer",
            Self::SynthesisFailure { .. } => "synthesis",
            Self::CaptureTimeout { .. } => "timeout",
            Self::FormatMismatch { .. } => "format",
            Self::DecodeFailure { .. } => "decode",
            Self::DeviceBusy { .. } => "device",
            Self::Cancelled => "cancelled",
            Self::VoiceNotFound { .. } => "voice",
            Self::InvalidInput { .. } => "input",
            Self::ConfigurationError { .. } => "configuration",
            Self::FileError { .. } => "file",
            Self::ItemFailed { .. } => "item",
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for NarrateError {
    fn from(err: std::io::Error) -> Self {
        Self::file(err.to_string())
    }
}

impl From<hound::Error> for NarrateError {
    fn from(err: hound::Error) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<toml::de::Error> for NarrateError {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration(format!("Invalid TOML: {err}"))
    }
}

impl From<tokio::time::error::Elapsed> for NarrateError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::capture_timeout(err.to_string())
    }
}

impl From<anyhow::Error> for NarrateError {
    fn from(err: anyhow::Error) -> Self {
        Self::synthesis(err.to_string())
    }
}
