//! Compile configuration with TOML loading.

use crate::error::{NarrateError, NarrateResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Name of the configuration file inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "narrate.toml";

/// Configuration for a compile run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Bounded wait for the engine to report the end of one utterance
    #[serde(with = "duration_secs", rename = "capture_timeout_secs")]
    pub capture_timeout: Duration,
    /// Bounded wait for device handshakes: recorder start, recorder
    /// finalize after stop, and the engine's voice list
    #[serde(with = "duration_secs", rename = "finalize_timeout_secs")]
    pub finalize_timeout: Duration,
    /// Maximum text length, in characters, accepted for a single queue item
    pub max_text_length: usize,
    /// File name attached to the encoded output
    pub output_file_name: String,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            capture_timeout: Duration::from_secs(120),
            finalize_timeout: Duration::from_secs(10),
            max_text_length: crate::MAX_TEXT_LENGTH,
            output_file_name: crate::DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl CompileConfig {
    /// Set the synthesis wait per item
    #[must_use]
    pub const fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Set the recorder finalize wait per item
    #[must_use]
    pub const fn with_finalize_timeout(mut self, timeout: Duration) -> Self {
        self.finalize_timeout = timeout;
        self
    }

    /// Set the maximum text length per item
    #[must_use]
    pub const fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }

    /// Set the output file name
    #[must_use]
    pub fn with_output_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.output_file_name = name.into();
        self
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is zero, the text limit is zero, or the
    /// output file name is empty or not a `.wav` name.
    pub fn validate(&self) -> NarrateResult<()> {
        if self.capture_timeout.is_zero() {
            return Err(NarrateError::configuration("capture_timeout must be greater than 0"));
        }

        if self.finalize_timeout.is_zero() {
            return Err(NarrateError::configuration("finalize_timeout must be greater than 0"));
        }

        if self.max_text_length == 0 {
            return Err(NarrateError::configuration("max_text_length must be greater than 0"));
        }

        let has_wav_extension = Path::new(&self.output_file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if !has_wav_extension {
            return Err(NarrateError::configuration(format!(
                "output_file_name must end in .wav, got '{}'",
                self.output_file_name
            )));
        }

        Ok(())
    }

    /// Parse a configuration from TOML text; missing keys take defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or the values are invalid.
    pub fn from_toml_str(content: &str) -> NarrateResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load<P: AsRef<Path>>(path: P) -> NarrateResult<Self> {
        let path = path.as_ref();
        debug!("Loading compile config from {}", path.display());

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            NarrateError::file(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;

        info!("Loaded compile config: {:?}", config);
        Ok(config)
    }

    /// Load the platform config file if present, defaults otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub async fn load_or_default() -> NarrateResult<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(path).await,
            _ => Ok(Self::default()),
        }
    }
}

/// Platform location of `narrate.toml`, e.g. `~/.config/narrate/narrate.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "narrate")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
