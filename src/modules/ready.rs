//! One-shot readiness notification.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Set once when every module has been attempted; waiters get a bounded
/// deadline instead of polling.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits until ready, failing with [`Error::Timeout`] after `deadline`.
    pub async fn wait(&self, deadline: Duration) -> Result<()> {
        let mut rx = self.tx.subscribe();
        // The borrowed value must be released before `rx` goes out of scope.
        let outcome = tokio::time::timeout(deadline, rx.wait_for(|ready| *ready))
            .await
            .map(|waited| waited.map(|_| ()));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(Error::Internal("readiness signal dropped".to_string())),
            Err(_) => Err(Error::Timeout(deadline)),
        }
    }
}
