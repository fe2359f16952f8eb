//! Exclusive access to the speech engine and its recording device.

use crate::error::{NarrateError, NarrateResult};
use crate::tts_engine::{AudioRecorder, SpeechEngine};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

/// Who currently holds the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// No client holds the device
    Idle,
    /// A compile run is capturing audio
    Compiling,
    /// A live preview is speaking
    Previewing,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Compiling => write!(f, "Compiling"),
            Self::Previewing => write!(f, "Previewing"),
        }
    }
}

/// What a client intends to do with the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeasePurpose {
    /// Record the engine output into a compiled file
    Compile,
    /// Speak aloud without recording
    Preview,
}

impl LeasePurpose {
    const fn state(self) -> DeviceState {
        match self {
            Self::Compile => DeviceState::Compiling,
            Self::Preview => DeviceState::Previewing,
        }
    }
}

/// Handle to the process-wide speech engine and recorder
///
/// Cloning shares the same underlying device and lease lock.
#[derive(Clone)]
pub struct SpeechDevice {
    engine: Arc<dyn SpeechEngine>,
    recorder: Arc<dyn AudioRecorder>,
    lease: Arc<Mutex<()>>,
    state: Arc<RwLock<DeviceState>>,
}

impl std::fmt::Debug for SpeechDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechDevice")
            .field("state", &*self.state.read())
            .field("sample_rate", &self.recorder.sample_rate())
            .finish_non_exhaustive()
    }
}

impl SpeechDevice {
    /// Wrap an engine and the recorder attached to its output
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechEngine>, recorder: Arc<dyn AudioRecorder>) -> Self {
        Self {
            engine,
            recorder,
            lease: Arc::new(Mutex::new(())),
            state: Arc::new(RwLock::new(DeviceState::Idle)),
        }
    }

    /// Current holder of the device
    #[must_use]
    pub fn state(&self) -> DeviceState {
        *self.state.read()
    }

    /// Take the device if it is free
    ///
    /// # Errors
    ///
    /// Returns `DeviceBusy` if another client holds the device.
    pub fn try_acquire(&self, purpose: LeasePurpose) -> NarrateResult<DeviceLease> {
        let guard = Arc::clone(&self.lease).try_lock_owned().map_err(|_| {
            NarrateError::device_busy(format!("device is in use ({})", self.state()))
        })?;
        Ok(self.grant(guard, purpose))
    }

    /// Wait until the device is free, then take it
    pub async fn acquire(&self, purpose: LeasePurpose) -> DeviceLease {
        debug!("Waiting for speech device ({:?})", purpose);
        let guard = Arc::clone(&self.lease).lock_owned().await;
        self.grant(guard, purpose)
    }

    fn grant(&self, guard: OwnedMutexGuard<()>, purpose: LeasePurpose) -> DeviceLease {
        *self.state.write() = purpose.state();
        info!("Speech device leased for {:?}", purpose);

        DeviceLease {
            engine: Arc::clone(&self.engine),
            recorder: Arc::clone(&self.recorder),
            state: Arc::clone(&self.state),
            _guard: guard,
        }
    }
}

/// Exclusive right to drive the device; released on drop
pub struct DeviceLease {
    engine: Arc<dyn SpeechEngine>,
    recorder: Arc<dyn AudioRecorder>,
    state: Arc<RwLock<DeviceState>>,
    _guard: OwnedMutexGuard<()>,
}

impl DeviceLease {
    /// The leased engine
    #[must_use]
    pub fn engine(&self) -> Arc<dyn SpeechEngine> {
        Arc::clone(&self.engine)
    }

    /// The leased recorder
    #[must_use]
    pub fn recorder(&self) -> Arc<dyn AudioRecorder> {
        Arc::clone(&self.recorder)
    }
}

impl std::fmt::Debug for DeviceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLease")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        *self.state.write() = DeviceState::Idle;
        debug!("Speech device released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts_engine::{MockAudioRecorder, MockSpeechEngine};
    use std::time::Duration;

    fn device() -> SpeechDevice {
        let mut recorder = MockAudioRecorder::new();
        recorder.expect_sample_rate().return_const(24_000u32);
        SpeechDevice::new(Arc::new(MockSpeechEngine::new()), Arc::new(recorder))
    }

    #[test]
    fn test_device_state_display() {
        assert_eq!(DeviceState::Idle.to_string(), "Idle");
        assert_eq!(DeviceState::Compiling.to_string(), "Compiling");
        assert_eq!(DeviceState::Previewing.to_string(), "Previewing");
    }

    #[test]
    fn test_second_client_is_rejected() {
        let device = device();
        assert_eq!(device.state(), DeviceState::Idle);

        let lease = device.try_acquire(LeasePurpose::Compile).unwrap();
        assert_eq!(device.state(), DeviceState::Compiling);

        let err = device.try_acquire(LeasePurpose::Preview).unwrap_err();
        assert!(matches!(err, NarrateError::DeviceBusy { .. }));
        assert!(err.to_string().contains("Compiling"));

        drop(lease);
        assert_eq!(device.state(), DeviceState::Idle);

        let preview = device.try_acquire(LeasePurpose::Preview).unwrap();
        assert_eq!(device.state(), DeviceState::Previewing);
        drop(preview);
    }

    #[test]
    fn test_clones_share_the_lease() {
        let device = device();
        let other = device.clone();

        let _lease = device.try_acquire(LeasePurpose::Compile).unwrap();
        assert!(other.try_acquire(LeasePurpose::Compile).is_err());
        assert_eq!(other.state(), DeviceState::Compiling);
    }

    #[tokio::test]
    async fn test_acquire_queues_until_released() {
        let device = device();
        let lease = device.try_acquire(LeasePurpose::Preview).unwrap();

        let waiter = {
            let device = device.clone();
            tokio::spawn(async move {
                let lease = device.acquire(LeasePurpose::Compile).await;
                let state = device.state();
                drop(lease);
                state
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(lease);
        let state_while_held = waiter.await.unwrap();
        assert_eq!(state_while_held, DeviceState::Compiling);
        assert_eq!(device.state(), DeviceState::Idle);
    }
}
