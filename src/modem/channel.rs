//! Command channel over a modem transport

use crate::transport::ModemTransport;
use anyhow::Result;
use async_trait::async_trait;
use bytes::BytesMut;
use sms_admin_shared::at::{self, Registration};
use sms_admin_shared::timing;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wait windows for the two kinds of exchange
#[derive(Debug, Clone)]
pub struct ChannelTimings {
    /// Wait after an ordinary command
    pub command_wait: Duration,
    /// Wait after the unread listing query
    pub listing_wait: Duration,
}

impl Default for ChannelTimings {
    fn default() -> Self {
        Self {
            command_wait: Duration::from_millis(timing::COMMAND_WAIT_MS),
            listing_wait: Duration::from_millis(timing::LISTING_WAIT_MS),
        }
    }
}

/// Something able to deliver a text message to a phone number
#[async_trait]
pub trait Notifier: Send {
    /// Returns `Ok(false)` when the modem refused the message
    async fn notify(&mut self, recipient: &str, text: &str) -> Result<bool>;
}

/// Sends AT commands and collects responses.
///
/// Not safe for concurrent use: the caller owns the channel and awaits
/// every exchange before starting the next one.
pub struct CommandChannel<T: ModemTransport> {
    transport: T,
    timings: ChannelTimings,
    rx_buf: BytesMut,
}

impl<T: ModemTransport> CommandChannel<T> {
    pub fn new(transport: T, timings: ChannelTimings) -> Self {
        Self {
            transport,
            timings,
            rx_buf: BytesMut::with_capacity(1600),
        }
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Write `command` + CR LF, wait `wait`, then drain whatever the modem
    /// produced. Only transport I/O errors are reported.
    pub async fn send(&mut self, command: &str, wait: Duration) -> Result<String> {
        let line = format!("{}{}", command, at::TERMINATOR);
        self.transport.write_all(line.as_bytes()).await?;

        tokio::time::sleep(wait).await;

        self.rx_buf.clear();
        self.transport.drain(&mut self.rx_buf).await?;
        let response = decode_response(&self.rx_buf);
        debug!("[MODEM] {:?} -> {:?}", command, response);
        Ok(response)
    }

    /// Send with the ordinary wait window
    pub async fn command(&mut self, command: &str) -> Result<String> {
        let wait = self.timings.command_wait;
        self.send(command, wait).await
    }

    /// Probe the modem and apply the one-time configuration
    pub async fn initialize(&mut self) -> Result<()> {
        let probe = self.command(at::PROBE).await?;
        if at::is_ok(&probe) {
            info!("[MODEM] {} answered probe", self.transport_name());
        } else {
            warn!("[MODEM] No OK to probe, got {:?}", probe);
        }

        self.set_text_mode().await?;

        let notif = self.command(at::NOTIFICATION_CONFIG).await?;
        if !at::is_ok(&notif) {
            warn!("[MODEM] Notification config not acknowledged: {:?}", notif);
        }

        let reg = self.command(at::REGISTRATION_QUERY).await?;
        match Registration::parse(&reg) {
            Some(state) if state.is_registered() => info!("[MODEM] Network registration: {:?}", state),
            Some(state) => warn!("[MODEM] Not registered on network: {:?}", state),
            None => warn!("[MODEM] Unreadable registration answer: {:?}", reg),
        }
        Ok(())
    }

    /// Switch to text mode (idempotent)
    pub async fn set_text_mode(&mut self) -> Result<()> {
        let resp = self.command(at::TEXT_MODE).await?;
        if !at::is_ok(&resp) {
            warn!("[MODEM] Text mode not acknowledged: {:?}", resp);
        }
        Ok(())
    }

    /// Raw response to the unread listing query
    pub async fn list_unread(&mut self) -> Result<String> {
        let wait = self.timings.listing_wait;
        self.send(at::LIST_UNREAD, wait).await
    }

    /// Two-step send of a text message.
    ///
    /// Precondition: the modem stays in text mode between the recipient
    /// command and the body; mode is not re-checked in between.
    pub async fn send_sms(&mut self, number: &str, text: &str) -> Result<bool> {
        self.command(at::TEXT_MODE).await?;
        self.command(at::GSM_CHARSET).await?;

        let recipient = at::normalize_recipient(number);
        let resp = self.command(&at::send_to(&recipient)).await?;
        if !at::has_prompt(&resp) {
            warn!("[MODEM] No body prompt for {}: {:?}", recipient, resp);
            // A late prompt would turn the next command into message text
            self.abort_body().await?;
            return Ok(false);
        }

        let resp = self.command(&at::message_body(text)).await?;
        let sent = at::is_ok(&resp);
        if sent {
            info!("[MODEM] Message sent to {}", recipient);
        } else {
            warn!("[MODEM] Message to {} not confirmed: {:?}", recipient, resp);
        }
        Ok(sent)
    }

    /// Leave body entry without sending; the answer is only logged
    async fn abort_body(&mut self) -> Result<()> {
        let mut esc = [0u8; 4];
        self.transport
            .write_all(at::ESC.encode_utf8(&mut esc).as_bytes())
            .await?;

        tokio::time::sleep(self.timings.command_wait).await;
        self.rx_buf.clear();
        self.transport.drain(&mut self.rx_buf).await?;
        debug!("[MODEM] Pending send aborted: {:?}", decode_response(&self.rx_buf));
        Ok(())
    }

    /// Remove a message from modem storage
    pub async fn delete(&mut self, index: u32) -> Result<bool> {
        let resp = self.command(&at::delete(index)).await?;
        if at::is_error(&resp) {
            warn!("[MODEM] Delete of slot {} refused: {:?}", index, resp);
            return Ok(false);
        }
        Ok(true)
    }

    /// Release the transport
    pub async fn close(mut self) -> Result<()> {
        self.transport.shutdown().await
    }
}

#[async_trait]
impl<T: ModemTransport> Notifier for CommandChannel<T> {
    async fn notify(&mut self, recipient: &str, text: &str) -> Result<bool> {
        self.send_sms(recipient, text).await
    }
}

/// Invalid byte sequences (line noise) are dropped, not replaced
fn decode_response(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out.trim().to_string()
}
