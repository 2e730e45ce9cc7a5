//! Trait abstraction for the network uplink to enable testing

use async_trait::async_trait;
use std::net::IpAddr;

use crate::error::Result;

/// Association status reported by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Associated,
    NotAssociated,
}

/// The uplink the node is exposed through
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Request (re)association
    async fn connect(&self) -> Result<()>;

    /// Current association status
    async fn status(&self) -> LinkStatus;

    /// Routable address assigned to the node, if any
    async fn local_address(&self) -> Option<IpAddr>;
}
