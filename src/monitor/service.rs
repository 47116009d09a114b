//! Monitor Loop
//!
//! Drives the poller at a fixed interval. A failed cycle is logged and
//! followed by a longer backoff; only the stop signal ends the loop, and it
//! is observed between cycles.

use super::MessagePoller;
use crate::modem::CommandChannel;
use crate::transport::ModemTransport;
use anyhow::Result;
use sms_admin_shared::state_machine::{MonitorEvent, MonitorStateMachine, Transition};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct MonitorLoop<T: ModemTransport> {
    channel: CommandChannel<T>,
    poller: MessagePoller,
    fsm: MonitorStateMachine,
}

impl<T: ModemTransport> MonitorLoop<T> {
    pub fn new(
        channel: CommandChannel<T>,
        poller: MessagePoller,
        poll_interval: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            channel,
            poller,
            fsm: MonitorStateMachine::new(poll_interval, backoff),
        }
    }

    /// Run until `stop` turns true, then release the transport.
    /// Returns the number of cycles run.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> Result<u64> {
        self.fsm.process_event(MonitorEvent::Start);
        info!("[MONITOR] Starting on {}", self.channel.transport_name());

        if let Err(e) = self.channel.initialize().await {
            error!("[MONITOR] Modem initialisation failed: {:#}", e);
        }

        loop {
            if *stop.borrow() {
                break;
            }

            let transition = match self.poller.poll_once(&mut self.channel).await {
                Ok(report) => {
                    if report.listed > 0 {
                        info!(
                            "[MONITOR] {} listed, {} dispatched, {} rejected, {} malformed, {} replies, {} deleted",
                            report.listed,
                            report.dispatched,
                            report.rejected,
                            report.malformed,
                            report.replies,
                            report.deleted
                        );
                    }
                    self.fsm.process_event(MonitorEvent::CycleSucceeded)
                }
                Err(e) => {
                    error!("[MONITOR] Polling cycle failed: {:#}", e);
                    self.fsm.process_event(MonitorEvent::CycleFailed)
                }
            };

            let delay = match transition {
                Transition::Poll { delay } => delay,
                Transition::Backoff {
                    delay,
                    consecutive_failures,
                } => {
                    warn!(
                        "[MONITOR] Backing off {:?} ({} consecutive failures)",
                        delay, consecutive_failures
                    );
                    delay
                }
                other => {
                    debug!("[MONITOR] Unexpected transition {:?}", other);
                    break;
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        warn!("[MONITOR] Stop signal sender dropped");
                    }
                    break;
                }
            }
        }

        self.fsm.process_event(MonitorEvent::StopRequested);
        let cycles = self.fsm.cycles();
        info!("[MONITOR] Stopped after {} cycles", cycles);

        self.channel.close().await?;
        Ok(cycles)
    }
}
