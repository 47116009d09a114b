//! Transport trait abstraction for the modem byte stream

use anyhow::Result;
use async_trait::async_trait;
use bytes::BytesMut;

/// A half-duplex byte stream to the modem
#[async_trait]
pub trait ModemTransport: Send {
    /// Write raw bytes to the modem
    async fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Move every byte currently buffered by the modem into `buf`
    /// without waiting for more. Returns the number of bytes read.
    async fn drain(&mut self, buf: &mut BytesMut) -> Result<usize>;

    /// Release the transport
    async fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this transport
    fn name(&self) -> &str;
}
