/// Synchronization primitives shared by the periodic tasks
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};

/// Counting wait/signal pair used for the sampling/control handshake
#[derive(Clone)]
pub struct Signal {
    permits: Arc<Semaphore>,
}

impl Signal {
    pub fn new() -> Self {
        Signal {
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Raise the signal once
    pub fn post(&self) {
        self.permits.add_permits(1);
    }

    /// Block until the signal has been raised, consuming one post
    ///
    /// Returns false if the signal was closed, which only happens on shutdown.
    pub async fn wait(&self) -> bool {
        match self.permits.acquire().await {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Wait for the signal or for shutdown, whichever comes first
    ///
    /// Returns true only when the signal was received and the program is still running.
    pub async fn wait_or_shutdown(&self, shutdown: &Shutdown) -> bool {
        if shutdown.is_triggered() {
            return false;
        }
        let mut shutdown = shutdown.clone();
        tokio::select! {
            received = self.wait() => received && !shutdown.is_triggered(),
            _ = shutdown.triggered() => false,
        }
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

/// Program-wide run flag, cleared once by the terminal or Ctrl+C
#[derive(Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Shutdown {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown has been requested
    pub async fn triggered(&mut self) {
        // The sender lives in every clone, so wait_for cannot fail while self exists
        let _ = self.receiver.wait_for(|stop| *stop).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
