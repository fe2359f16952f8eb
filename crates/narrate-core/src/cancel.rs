//! Caller-side abort of an in-flight compile run.

use tokio::sync::watch;

/// Create a connected canceller/signal pair
#[must_use]
pub fn cancellation() -> (Canceller, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (Canceller(tx), CancelSignal(rx))
}

/// Trigger side, held by the caller
#[derive(Debug)]
pub struct Canceller(watch::Sender<bool>);

impl Canceller {
    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Observer side, passed into the pipeline
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// A signal that never fires
    #[must_use]
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self(rx)
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once cancellation is requested
    ///
    /// Pends forever if the canceller is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}
