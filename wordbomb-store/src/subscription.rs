use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Disposable handle on a change feed. Delivery is best-effort: a slow
/// reader skips what it missed, callers reconcile by polling.
pub struct Subscription<T> {
    topic: String,
    receiver: Option<broadcast::Receiver<T>>,
}

impl<T: Clone> Subscription<T> {
    pub fn new(topic: impl Into<String>, receiver: broadcast::Receiver<T>) -> Self {
        Self {
            topic: topic.into(),
            receiver: Some(receiver),
        }
    }

    /// Wait for the next change. `None` once unsubscribed or the feed closed.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscription {} lagged, skipped {} notifications", self.topic, skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("Subscription {} closed", self.topic);
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Subscription {} lagged, skipped {} notifications", self.topic, skipped);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        if self.receiver.take().is_some() {
            debug!("Unsubscribed from {}", self.topic);
        }
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}
