//! Encoded output files and their delivery to disk.

use crate::error::{NarrateError, NarrateResult};
use crate::sample_buffer::SampleBuffer;
use crate::wav_writer;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// MIME type of every compiled file
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Immutable WAV bytes produced by one compile run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    bytes: Vec<u8>,
    file_name: String,
}

impl EncodedFile {
    /// Wrap encoded WAV bytes under a download name
    #[must_use]
    pub fn new<S: Into<String>>(bytes: Vec<u8>, file_name: S) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
        }
    }

    /// The file contents
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the file contents
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Suggested download name
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// MIME type for delivery
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        WAV_MIME_TYPE
    }

    /// File length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Turns compiled audio into deliverable files
#[derive(Debug, Clone)]
pub struct AudioWriter {
    file_name: String,
}

impl AudioWriter {
    /// Create a writer using the default output name
    #[must_use]
    pub fn new() -> Self {
        Self::with_file_name(crate::DEFAULT_FILE_NAME)
    }

    /// Create a writer with a custom output name
    #[must_use]
    pub fn with_file_name<S: Into<String>>(file_name: S) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Encode compiled audio as a WAV file
    ///
    /// # Errors
    ///
    /// Returns `EmptyBuffer` if `buffer` has no samples, or `InvalidInput`
    /// if it cannot be represented as mono 16-bit WAV.
    pub fn encode(&self, buffer: &SampleBuffer) -> NarrateResult<EncodedFile> {
        let bytes = wav_writer::encode(buffer)?;
        info!(
            "Encoded {} samples at {} Hz into {} ({} bytes)",
            buffer.len(),
            buffer.sample_rate,
            self.file_name,
            bytes.len()
        );
        Ok(EncodedFile::new(bytes, self.file_name.clone()))
    }

    /// Write `file` to disk
    ///
    /// If `target` is an existing directory the file's own name is used
    /// inside it. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save<P: AsRef<Path>>(&self, file: &EncodedFile, target: P) -> NarrateResult<PathBuf> {
        let target = target.as_ref();
        let path = if tokio::fs::metadata(target).await.is_ok_and(|meta| meta.is_dir()) {
            target.join(file.file_name())
        } else {
            target.to_path_buf()
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                NarrateError::file(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }

        debug!("Writing {} bytes to {}", file.len(), path.display());
        tokio::fs::write(&path, file.bytes()).await.map_err(|e| {
            NarrateError::file(format!("Failed to write {}: {e}", path.display()))
        })?;

        info!("Successfully wrote audio file: {}", path.display());
        Ok(path)
    }
}

impl Default for AudioWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encoded_file_metadata() {
        let writer = AudioWriter::new();
        let file = writer.encode(&SampleBuffer::mono(24_000, vec![0.1, -0.1])).unwrap();

        assert_eq!(file.file_name(), "compiled_audio.wav");
        assert_eq!(file.mime_type(), "audio/wav");
        assert_eq!(file.len(), 48);
        assert!(!file.is_empty());
        assert_eq!(&file.bytes()[0..4], b"RIFF");
    }

    #[test]
    fn test_custom_file_name() {
        let writer = AudioWriter::with_file_name("book.wav");
        let file = writer.encode(&SampleBuffer::mono(24_000, vec![0.0])).unwrap();
        assert_eq!(file.file_name(), "book.wav");
    }

    #[test]
    fn test_encode_empty_buffer() {
        let writer = AudioWriter::default();
        assert_eq!(
            writer.encode(&SampleBuffer::empty(24_000)).unwrap_err(),
            NarrateError::EmptyBuffer
        );
    }

    #[tokio::test]
    async fn test_save_into_directory_uses_file_name() {
        let dir = TempDir::new().unwrap();
        let writer = AudioWriter::new();
        let file = writer.encode(&SampleBuffer::mono(24_000, vec![0.5; 10])).unwrap();

        let path = writer.save(&file, dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("compiled_audio.wav"));
        assert_eq!(std::fs::read(&path).unwrap(), file.bytes());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let writer = AudioWriter::new();
        let file = EncodedFile::new(vec![1, 2, 3], "x.wav");
        let target = dir.path().join("nested/deeper/out.wav");

        let path = writer.save(&file, &target).await.unwrap();

        assert_eq!(path, target);
        assert_eq!(std::fs::read(&target).unwrap(), vec![1, 2, 3]);
    }
}
