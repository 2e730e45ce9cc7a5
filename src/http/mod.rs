//! # HTTP Exposition Module
//!
//! Serves the coordinate store over HTTP.
//!
//! This module handles:
//! - Route registration (see [`handlers`])
//! - Binding the listener and running the server until shutdown
//! - An explicit `NotStarted`/`Running` lifecycle so a second start is a no-op

pub mod handlers;

pub use handlers::{router, CORS_HEADERS};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::HttpConfig;
use crate::error::{GpsNodeError, Result};
use crate::shutdown::Shutdown;
use crate::store::CoordinateStore;

/// Server lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    NotStarted = 0,
    Running = 1,
}

/// Result of [`ExpositionService::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Listening on this address
    Started(SocketAddr),
    /// A previous start already launched the server
    AlreadyRunning,
}

/// HTTP front end for the coordinate store
pub struct ExpositionService {
    store: Arc<CoordinateStore>,
    config: HttpConfig,
    lifecycle: AtomicU8,
}

impl ExpositionService {
    pub fn new(store: Arc<CoordinateStore>, config: HttpConfig) -> Self {
        Self {
            store,
            config,
            lifecycle: AtomicU8::new(Lifecycle::NotStarted as u8),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.lifecycle.load(Ordering::Acquire) {
            0 => Lifecycle::NotStarted,
            _ => Lifecycle::Running,
        }
    }

    /// Bind the listener and spawn the server
    ///
    /// Only the first call starts a server; later calls return
    /// [`StartOutcome::AlreadyRunning`]. The server stops when `shutdown`
    /// fires.
    ///
    /// # Errors
    ///
    /// Returns [`GpsNodeError::Server`] if the address cannot be bound or the
    /// bound address cannot be read back. The service is left `NotStarted`
    /// so a later start can retry.
    pub async fn start(&self, shutdown: Shutdown) -> Result<StartOutcome> {
        if self
            .lifecycle
            .compare_exchange(
                Lifecycle::NotStarted as u8,
                Lifecycle::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            info!("HTTP service already running, ignoring start request");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let (listener, address) = match self.bind().await {
            Ok(bound) => bound,
            Err(e) => {
                self.lifecycle
                    .store(Lifecycle::NotStarted as u8, Ordering::Release);
                return Err(e);
            }
        };

        let app = router(Arc::clone(&self.store), self.config.max_body_bytes);
        tokio::spawn(async move {
            let mut shutdown = shutdown;
            let server = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.recv().await });

            if let Err(e) = server.await {
                error!("HTTP server failed: {}", e);
            }
            info!("HTTP server stopped");
        });

        info!("HTTP service listening on http://{}", address);
        Ok(StartOutcome::Started(address))
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr)> {
        let requested = SocketAddr::new(self.config.bind_address, self.config.port);
        let bind_error = |e: std::io::Error| {
            GpsNodeError::Server(format!("Failed to bind {}: {}", requested, e))
        };

        let listener = TcpListener::bind(requested).await.map_err(bind_error)?;
        let address = listener.local_addr().map_err(bind_error)?;
        Ok((listener, address))
    }
}
