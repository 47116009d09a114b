//! Serial port transport backed by tokio-serial

use crate::transport::traits::ModemTransport;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// Serial line settings for the modem
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path (e.g. "/dev/serial0" or "/dev/ttyUSB2")
    pub port: String,
    pub baud: u32,
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/serial0".into(),
            baud: 9600,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Modem attached to a serial device
pub struct SerialTransport {
    inner: SerialStream,
    port: String,
}

impl SerialTransport {
    /// Open the serial device
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let inner = tokio_serial::new(&config.port, config.baud)
            .timeout(config.read_timeout)
            .open_native_async()
            .with_context(|| format!("failed to open {} at {} baud", config.port, config.baud))?;

        Ok(Self {
            inner,
            port: config.port.clone(),
        })
    }
}

#[async_trait]
impl ModemTransport for SerialTransport {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        AsyncWriteExt::write_all(&mut self.inner, data).await?;
        AsyncWriteExt::flush(&mut self.inner).await?;
        Ok(())
    }

    async fn drain(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let mut total = 0;
        loop {
            let available = SerialPort::bytes_to_read(&self.inner)? as usize;
            if available == 0 {
                break;
            }
            let mut chunk = vec![0u8; available];
            let n = AsyncReadExt::read(&mut self.inner, &mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            total += n;
        }
        Ok(total)
    }

    async fn shutdown(&mut self) -> Result<()> {
        AsyncWriteExt::shutdown(&mut self.inner).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.port
    }
}
