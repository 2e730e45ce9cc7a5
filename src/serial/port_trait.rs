//! Trait abstraction for serial byte sources to enable testing

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Source of raw serial bytes
#[async_trait]
pub trait SerialSource: Send {
    /// Read up to `buf.len()` bytes, waiting at most `timeout`
    ///
    /// Returns `Ok(0)` when nothing arrived in time. That is not an error.
    async fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

/// Adapter giving any `AsyncRead` (serial stream, pipe, socket) a bounded read
pub struct AsyncReadSource<R> {
    inner: R,
}

impl<R> AsyncReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

/// The production source: a `tokio_serial` stream
pub type TokioSerialPort = AsyncReadSource<tokio_serial::SerialStream>;

#[async_trait]
impl<R> SerialSource for AsyncReadSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        match tokio::time::timeout(timeout, self.inner.read(buf)).await {
            Ok(result) => result,
            Err(_elapsed) => Ok(0),
        }
    }
}
