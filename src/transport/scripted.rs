//! In-memory modem answering AT commands from a script, for tests

use crate::transport::traits::ModemTransport;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use sms_admin_shared::at;
use std::sync::{Arc, Mutex};

/// Scripted modem: records every command and queues a canned answer
pub struct ScriptedModem {
    listing: String,
    registration: String,
    pending: BytesMut,
    log: Arc<Mutex<Vec<String>>>,
    fail_writes: bool,
    prompt: bool,
}

impl ScriptedModem {
    pub fn new() -> Self {
        Self {
            listing: "\r\nOK\r\n".into(),
            registration: "\r\n+CREG: 0,1\r\n\r\nOK\r\n".into(),
            pending: BytesMut::new(),
            log: Arc::new(Mutex::new(Vec::new())),
            fail_writes: false,
            prompt: true,
        }
    }

    /// Answer `AT+CMGL` with this listing
    pub fn with_listing(mut self, listing: &str) -> Self {
        self.listing = listing.to_string();
        self
    }

    /// Every write fails with an I/O error
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// `AT+CMGS` answers ERROR instead of the body prompt
    pub fn without_prompt(mut self) -> Self {
        self.prompt = false;
        self
    }

    /// Handle on the commands written so far (terminators removed)
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }

    fn answer(&self, command: &str) -> String {
        if command.ends_with(at::CTRL_Z) {
            "\r\n+CMGS: 12\r\n\r\nOK\r\n".into()
        } else if command.starts_with("AT+CMGL") {
            self.listing.clone()
        } else if command.starts_with("AT+CMGS=") {
            if self.prompt {
                "\r\n> ".into()
            } else {
                "\r\nERROR\r\n".into()
            }
        } else if command == at::REGISTRATION_QUERY {
            self.registration.clone()
        } else {
            "\r\nOK\r\n".into()
        }
    }
}

/// Commands of a log that match a prefix
pub fn sent(log: &Arc<Mutex<Vec<String>>>, prefix: &str) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with(prefix))
        .cloned()
        .collect()
}

#[async_trait]
impl ModemTransport for ScriptedModem {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("serial write failed: broken pipe"));
        }
        let command = String::from_utf8_lossy(data)
            .trim_end_matches(at::TERMINATOR)
            .to_string();
        let answer = self.answer(&command);
        self.log.lock().unwrap().push(command);
        self.pending.extend_from_slice(answer.as_bytes());
        Ok(())
    }

    async fn drain(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let n = self.pending.len();
        buf.extend_from_slice(&self.pending.split());
        Ok(n)
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
