//! # Shutdown Signal
//!
//! Cooperative stop signal for the long-running loops. Production never
//! fires it except on Ctrl+C; tests use it to end loops deterministically.

use tokio::sync::watch;

/// Sending half, held by whoever decides to stop the node
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

/// Receiving half, cloned into every loop
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

/// Create a connected trigger/signal pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

impl ShutdownTrigger {
    /// Signal every [`Shutdown`] handle
    pub fn fire(&self) {
        self.0.send_replace(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait until the trigger fires
    ///
    /// If the trigger is dropped without firing this never completes.
    pub async fn recv(&mut self) {
        if self.0.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_recv_completes_after_fire() {
        let (trigger, mut shutdown) = channel();
        assert!(!shutdown.is_triggered());

        trigger.fire();
        shutdown.recv().await;
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_clones_all_observe_fire() {
        let (trigger, shutdown) = channel();
        let mut a = shutdown.clone();
        let mut b = shutdown;

        trigger.fire();
        a.recv().await;
        b.recv().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trigger_never_completes() {
        let (trigger, mut shutdown) = channel();
        drop(trigger);

        let result = tokio::time::timeout(Duration::from_secs(60), shutdown.recv()).await;
        assert!(result.is_err());
    }
}
