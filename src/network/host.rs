//! # Host Transport
//!
//! [`Transport`] backed by the host operating system's network stack.
//!
//! The radio is managed by the OS here, so "associated" means the routing
//! table has a route towards the probe address, and the local address is
//! the source address the OS picks for that route. Resolving a route with
//! a connected UDP socket sends no packets.

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

use super::transport::{LinkStatus, Transport};
use crate::error::{GpsNodeError, Result};

/// Transport probing the host routing table
#[derive(Debug, Clone)]
pub struct HostTransport {
    probe_address: String,
}

impl HostTransport {
    /// # Arguments
    ///
    /// * `probe_address` - Any routable `host:port`; no traffic is sent to it
    pub fn new(probe_address: impl Into<String>) -> Self {
        Self {
            probe_address: probe_address.into(),
        }
    }

    async fn route_source(&self) -> Result<IpAddr> {
        let target: SocketAddr = tokio::net::lookup_host(self.probe_address.as_str())
            .await?
            .next()
            .ok_or_else(|| {
                GpsNodeError::Network(format!("cannot resolve {}", self.probe_address))
            })?;

        let bind = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(bind).await?;
        socket.connect(target).await?;
        let local = socket.local_addr()?.ip();

        if local.is_unspecified() || local.is_loopback() {
            return Err(GpsNodeError::Network(format!(
                "no external route to {}",
                self.probe_address
            )));
        }
        Ok(local)
    }
}

#[async_trait]
impl Transport for HostTransport {
    async fn connect(&self) -> Result<()> {
        self.route_source().await.map(|_| ())
    }

    async fn status(&self) -> LinkStatus {
        match self.route_source().await {
            Ok(_) => LinkStatus::Associated,
            Err(e) => {
                debug!("Host link down: {}", e);
                LinkStatus::NotAssociated
            }
        }
    }

    async fn local_address(&self) -> Option<IpAddr> {
        self.route_source().await.ok()
    }
}
