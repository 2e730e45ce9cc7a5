//! # Network Module
//!
//! Brings up the uplink and keeps it alive.
//!
//! This module handles:
//! - One-time association with fixed-interval retries, then waiting a
//!   bounded number of attempts for a routable address
//! - A watchdog that polls association status and requests reconnection
//! - Publishing the [`ConnectivityState`] to read-only subscribers
//!
//! Association is retried forever with a fixed interval.

pub mod host;
pub mod transport;

pub use host::HostTransport;
pub use transport::{LinkStatus, Transport};

use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::shutdown::Shutdown;

/// Uplink state, written only by [`ConnectivityManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owner of the uplink: bring-up followed by the watchdog
pub struct ConnectivityManager<T> {
    transport: T,
    retry_interval: Duration,
    address_attempts: u32,
    watchdog_interval: Duration,
    state: watch::Sender<ConnectivityState>,
}

impl<T: Transport> ConnectivityManager<T> {
    pub fn new(transport: T, config: &NetworkConfig) -> Self {
        let (state, _) = watch::channel(ConnectivityState::Disconnected);
        Self {
            transport,
            retry_interval: config.retry_interval(),
            address_attempts: config.address_attempts.max(1),
            watchdog_interval: config.watchdog_interval(),
            state,
        }
    }

    /// Read-only view of the connectivity state
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    fn set_state(&self, next: ConnectivityState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            info!("Connectivity {:?} -> {:?}", current, next);
            *current = next;
            true
        });
    }

    /// Associate, then wait for an address
    ///
    /// Blocks until association succeeds. Returns the acquired address, or
    /// `None` when none was assigned within the configured attempts; that is
    /// reported as a warning and the watchdog keeps checking for one.
    pub async fn bring_up(&self) -> Option<IpAddr> {
        self.set_state(ConnectivityState::Connecting);

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.transport.connect().await {
                Ok(()) => {
                    info!("Uplink associated after {} attempt(s)", attempt);
                    break;
                }
                Err(e) => {
                    warn!("Association attempt {} failed: {}", attempt, e);
                    sleep(self.retry_interval).await;
                }
            }
        }

        for attempt in 1..=self.address_attempts {
            if let Some(address) = self.transport.local_address().await {
                info!("Uplink address {}", address);
                self.set_state(ConnectivityState::Connected);
                return Some(address);
            }
            debug!("No address yet ({}/{})", attempt, self.address_attempts);
            sleep(self.retry_interval).await;
        }

        warn!(
            "No address assigned after {} attempts; HTTP service unreachable for now",
            self.address_attempts
        );
        None
    }

    /// One watchdog tick: reconnect if association was lost
    pub async fn check_link(&self) -> ConnectivityState {
        match self.transport.status().await {
            LinkStatus::NotAssociated => {
                if self.state() == ConnectivityState::Connected {
                    warn!("Uplink association lost, requesting reconnection");
                } else {
                    debug!("Uplink still not associated, requesting reconnection");
                }
                self.set_state(ConnectivityState::Disconnected);

                match self.transport.connect().await {
                    Ok(()) => self.set_state(ConnectivityState::Connecting),
                    Err(e) => debug!("Reconnect request failed: {}", e),
                }
            }
            LinkStatus::Associated => {
                if self.state() != ConnectivityState::Connected {
                    match self.transport.local_address().await {
                        Some(address) => {
                            info!("Uplink address {}", address);
                            self.set_state(ConnectivityState::Connected);
                        }
                        None => self.set_state(ConnectivityState::Connecting),
                    }
                }
            }
        }

        self.state()
    }

    /// Poll the link every watchdog interval until shutdown
    pub async fn watchdog(&self, mut shutdown: Shutdown) {
        let mut ticker = interval(self.watchdog_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    self.check_link().await;
                }
            }
        }
    }

    /// Bring-up followed by the watchdog, for the life of the process
    pub async fn run(self, mut shutdown: Shutdown) {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Connectivity manager stopped during bring-up");
                return;
            }
            _ = self.bring_up() => {}
        }

        info!("Connectivity watchdog every {:?}", self.watchdog_interval);
        self.watchdog(shutdown).await;
        info!("Connectivity manager stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::transport::MockTransport;
    use super::*;
    use crate::error::GpsNodeError;
    use crate::shutdown;
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use tokio::time::Instant;

    const ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 4, 20));

    fn config() -> NetworkConfig {
        NetworkConfig::default()
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "expected ~{:?}, elapsed {:?}",
            expected,
            elapsed
        );
    }

    fn link_error() -> GpsNodeError {
        GpsNodeError::Network("access point not found".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_bring_up_retries_association() {
        let mut mock = MockTransport::new();
        let mut calls = 0;
        mock.expect_connect().times(3).returning(move || {
            calls += 1;
            if calls < 3 {
                Err(link_error())
            } else {
                Ok(())
            }
        });
        mock.expect_local_address()
            .times(1)
            .returning(|| Some(ADDRESS));

        let manager = ConnectivityManager::new(mock, &config());
        let state = manager.subscribe();
        let start = Instant::now();

        assert_eq!(manager.bring_up().await, Some(ADDRESS));
        assert_elapsed(start, Duration::from_secs(4));
        assert_eq!(*state.borrow(), ConnectivityState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bring_up_without_address_is_not_fatal() {
        let mut mock = MockTransport::new();
        mock.expect_connect().times(1).returning(|| Ok(()));
        mock.expect_local_address().times(10).returning(|| None);

        let manager = ConnectivityManager::new(mock, &config());
        let start = Instant::now();

        assert_eq!(manager.bring_up().await, None);
        assert_elapsed(start, Duration::from_secs(20));
        assert_eq!(manager.state(), ConnectivityState::Connecting);
    }

    #[tokio::test]
    async fn test_check_link_reconnects_when_not_associated() {
        let mut mock = MockTransport::new();
        let mut statuses = vec![LinkStatus::NotAssociated, LinkStatus::Associated];
        mock.expect_status()
            .times(2)
            .returning(move || statuses.remove(0));
        mock.expect_connect().times(1).returning(|| Ok(()));
        mock.expect_local_address()
            .times(1)
            .returning(|| Some(ADDRESS));

        let manager = ConnectivityManager::new(mock, &config());

        assert_eq!(manager.check_link().await, ConnectivityState::Connecting);
        assert_eq!(manager.check_link().await, ConnectivityState::Connected);
    }

    #[tokio::test]
    async fn test_check_link_failed_reconnect_stays_disconnected() {
        let mut mock = MockTransport::new();
        mock.expect_status()
            .returning(|| LinkStatus::NotAssociated);
        mock.expect_connect()
            .times(2)
            .returning(|| Err(link_error()));

        let manager = ConnectivityManager::new(mock, &config());

        assert_eq!(manager.check_link().await, ConnectivityState::Disconnected);
        assert_eq!(manager.check_link().await, ConnectivityState::Disconnected);
    }

    #[tokio::test]
    async fn test_check_link_healthy_is_quiet() {
        let mut mock = MockTransport::new();
        mock.expect_connect().times(1).returning(|| Ok(()));
        mock.expect_local_address()
            .times(1)
            .returning(|| Some(ADDRESS));
        mock.expect_status()
            .times(3)
            .returning(|| LinkStatus::Associated);

        let manager = ConnectivityManager::new(mock, &config());
        manager.bring_up().await;

        for _ in 0..3 {
            assert_eq!(manager.check_link().await, ConnectivityState::Connected);
        }
    }

    #[tokio::test]
    async fn test_check_link_promotes_late_address() {
        let mut mock = MockTransport::new();
        mock.expect_status().returning(|| LinkStatus::Associated);
        let mut addresses = vec![None, Some(ADDRESS)];
        mock.expect_local_address()
            .times(2)
            .returning(move || addresses.remove(0));

        let manager = ConnectivityManager::new(mock, &config());

        assert_eq!(manager.check_link().await, ConnectivityState::Connecting);
        assert_eq!(manager.check_link().await, ConnectivityState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_polls_every_interval() {
        let mut mock = MockTransport::new();
        mock.expect_status()
            .times(3)
            .returning(|| LinkStatus::Associated);
        mock.expect_local_address().returning(|| Some(ADDRESS));

        let manager = Arc::new(ConnectivityManager::new(mock, &config()));
        let (trigger, shutdown) = shutdown::channel();

        let watchdog = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.watchdog(shutdown).await })
        };

        tokio::time::sleep(Duration::from_secs(17)).await;
        trigger.fire();
        watchdog.await.unwrap();

        assert_eq!(manager.state(), ConnectivityState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_during_bring_up() {
        let mut mock = MockTransport::new();
        mock.expect_connect().returning(|| Err(link_error()));

        let manager = ConnectivityManager::new(mock, &config());
        let state = manager.subscribe();
        let (trigger, shutdown) = shutdown::channel();

        let handle = tokio::spawn(manager.run(shutdown));
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(*state.borrow(), ConnectivityState::Connecting);

        trigger.fire();
        handle.await.unwrap();
    }
}
