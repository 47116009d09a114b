//! One polling cycle: list, decode, authorize, dispatch, reply, delete

use crate::auth::AuthorizationGate;
use crate::command::{CommandExecutor, CommandResult};
use crate::modem::CommandChannel;
use crate::transport::ModemTransport;
use anyhow::Result;
use sms_admin_shared::{decode_body, listing, parse_listing, ModemMessage};
use tracing::{debug, error, info, warn};

/// Counters for one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Records found in the listing, malformed ones included
    pub listed: usize,
    /// Messages from authorized senders handed to the executor
    pub dispatched: usize,
    /// Messages dropped because the sender is not allowed
    pub rejected: usize,
    pub malformed: usize,
    /// Delete commands accepted by the modem
    pub deleted: usize,
    pub replies: usize,
}

pub struct MessagePoller {
    gate: AuthorizationGate,
    executor: CommandExecutor,
}

impl MessagePoller {
    pub fn new(gate: AuthorizationGate, executor: CommandExecutor) -> Self {
        Self { gate, executor }
    }

    /// Run one cycle. Only transport errors are returned; problems with a
    /// single message are logged and the next message is processed.
    pub async fn poll_once<T: ModemTransport>(
        &self,
        channel: &mut CommandChannel<T>,
    ) -> Result<PollReport> {
        let mut report = PollReport::default();

        channel.set_text_mode().await?;
        let response = channel.list_unread().await?;
        if !listing::has_records(&response) {
            return Ok(report);
        }

        for record in parse_listing(&response) {
            report.listed += 1;

            let index = match record {
                Ok(message) => {
                    self.process(&message, channel, &mut report).await;
                    Some(message.index)
                }
                Err(e) => {
                    warn!("[POLL] Skipping malformed record: {}", e);
                    report.malformed += 1;
                    e.index()
                }
            };

            // Delete whatever happened, so no slot is handled twice
            match index {
                Some(index) => {
                    if channel.delete(index).await? {
                        report.deleted += 1;
                    }
                }
                None => warn!("[POLL] Record without index cannot be deleted"),
            }
        }

        debug!("[POLL] Cycle done: {:?}", report);
        Ok(report)
    }

    async fn process<T: ModemTransport>(
        &self,
        message: &ModemMessage,
        channel: &mut CommandChannel<T>,
        report: &mut PollReport,
    ) {
        let decoded = decode_body(&message.raw_body);
        if let Some(anomaly) = &decoded.anomaly {
            warn!("[POLL] Slot {}: {}", message.index, anomaly);
        }
        info!(
            "[POLL] Message {} from {}: {:?}",
            message.index, message.sender, decoded.text
        );

        // Silence towards unknown senders: no reply, no acknowledgement
        if !self.gate.is_authorized(&message.sender) {
            warn!("[AUTH] Rejected sender {} (slot {})", message.sender, message.index);
            report.rejected += 1;
            return;
        }

        report.dispatched += 1;
        let result = self
            .executor
            .execute(&decoded.text, &message.sender, channel)
            .await;

        if let CommandResult::Reply { message: reply } = result {
            match channel.send_sms(&message.sender, &reply).await {
                Ok(true) => report.replies += 1,
                Ok(false) => warn!("[POLL] Reply to {} not confirmed", message.sender),
                Err(e) => error!("[POLL] Failed to reply to {}: {:#}", message.sender, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::{instant_settings, RecordingShell};
    use crate::command::{CommandRegistry, UNKNOWN_COMMAND_REPLY};
    use crate::config::CommandsConfig;
    use crate::modem::ChannelTimings;
    use crate::transport::scripted::{sent, ScriptedModem};
    use sms_admin_shared::at::CTRL_Z;
    use std::sync::Arc;
    use std::time::Duration;

    const OWNER: &str = "+221777350027";

    fn record(index: u32, sender: &str, body: &str) -> String {
        format!(
            "+CMGL: {},\"REC UNREAD\",\"{}\",\"\",\"24/10/19,12:00:00+00\"\r\n{}\r\n",
            index, sender, body
        )
    }

    fn listing(records: &[String]) -> String {
        format!("AT+CMGL=\"REC UNREAD\"\r\r\n{}\r\nOK\r\n", records.concat())
    }

    fn setup(
        listing: &str,
        output: &str,
    ) -> (
        MessagePoller,
        CommandChannel<ScriptedModem>,
        Arc<std::sync::Mutex<Vec<String>>>,
        Arc<RecordingShell>,
    ) {
        let modem = ScriptedModem::new().with_listing(listing);
        let log = modem.log();
        let channel = CommandChannel::new(
            modem,
            ChannelTimings {
                command_wait: Duration::ZERO,
                listing_wait: Duration::ZERO,
            },
        );
        let shell = RecordingShell::new(output);
        let executor = CommandExecutor::new(
            CommandRegistry::new(&CommandsConfig::default()),
            shell.clone(),
            instant_settings(),
        );
        let poller = MessagePoller::new(AuthorizationGate::new([OWNER, "+221764489909"]), executor);
        (poller, channel, log, shell)
    }

    /// Bodies of outgoing messages, Ctrl-Z removed
    fn bodies(log: &Arc<std::sync::Mutex<Vec<String>>>) -> Vec<String> {
        log.lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.strip_suffix(CTRL_Z).map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_no_listing_no_work() {
        let (poller, mut channel, log, shell) = setup("AT+CMGL=\"REC UNREAD\"\r\r\nOK", "");
        let report = poller.poll_once(&mut channel).await.unwrap();

        assert_eq!(report, PollReport::default());
        assert_eq!(log.lock().unwrap().clone(), vec!["AT+CMGF=1", "AT+CMGL=\"REC UNREAD\""]);
        assert!(shell.calls().is_empty());
    }

    #[tokio::test]
    async fn test_authorized_status_query() {
        let output = format!("temp={}", "4".repeat(300));
        let (poller, mut channel, log, shell) =
            setup(&listing(&[record(1, OWNER, "temp")]), &output);

        let report = poller.poll_once(&mut channel).await.unwrap();
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.replies, 1);
        assert_eq!(report.deleted, 1);

        assert_eq!(shell.calls(), vec!["vcgencmd measure_temp"]);
        assert_eq!(sent(&log, "AT+CMGS="), vec![format!("AT+CMGS=\"{}\"", OWNER)]);

        let replies = bodies(&log);
        assert_eq!(replies.len(), 1);
        let output = replies[0].strip_prefix("Résultat de temp:\n").unwrap();
        assert!(output.chars().count() <= 150);
        assert!(output.starts_with("temp=44"));
        assert_eq!(sent(&log, "AT+CMGD"), vec!["AT+CMGD=1"]);
    }

    #[tokio::test]
    async fn test_shutdown_acknowledged_once() {
        let (poller, mut channel, log, shell) =
            setup(&listing(&[record(2, OWNER, "shutdown")]), "");

        poller.poll_once(&mut channel).await.unwrap();

        assert_eq!(bodies(&log), vec!["Arrêt du système en cours..."]);
        assert_eq!(shell.calls(), vec!["sudo shutdown -h now"]);

        // ack before the command, delete after it
        let commands = log.lock().unwrap().clone();
        let ack = commands.iter().position(|c| c.ends_with(CTRL_Z)).unwrap();
        let delete = commands.iter().position(|c| c == "AT+CMGD=2").unwrap();
        assert!(ack < delete);
    }

    #[tokio::test]
    async fn test_unauthorized_sender_gets_silence() {
        let (poller, mut channel, log, shell) =
            setup(&listing(&[record(3, "+15551234567", "reboot")]), "");

        let report = poller.poll_once(&mut channel).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(report.dispatched, 0);
        assert!(sent(&log, "AT+CMGS").is_empty());
        assert!(shell.calls().is_empty());
        assert_eq!(sent(&log, "AT+CMGD"), vec!["AT+CMGD=3"]);
    }

    #[tokio::test]
    async fn test_sender_without_plus_is_not_authorized() {
        let (poller, mut channel, log, shell) =
            setup(&listing(&[record(4, "221777350027", "uptime")]), "up 3 days");

        let report = poller.poll_once(&mut channel).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert!(bodies(&log).is_empty());
        assert!(shell.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_records_still_deleted() {
        let records = [
            "+CMGL: 5,\"REC UNREAD\"\r\nreboot\r\n".to_string(),
            "+CMGL: 6,\"REC UNREAD\",\"\",\"\"\r\nshutdown\r\n".to_string(),
            record(7, OWNER, "uptime"),
        ];
        let (poller, mut channel, log, shell) = setup(&listing(&records), "up 3 days");

        let report = poller.poll_once(&mut channel).await.unwrap();
        assert_eq!(report.listed, 3);
        assert_eq!(report.malformed, 2);
        assert_eq!(report.dispatched, 1);
        assert_eq!(shell.calls(), vec!["uptime -p"]);
        assert_eq!(bodies(&log), vec!["Résultat de uptime:\nup 3 days"]);
        assert_eq!(
            sent(&log, "AT+CMGD"),
            vec!["AT+CMGD=5", "AT+CMGD=6", "AT+CMGD=7"]
        );
    }

    #[tokio::test]
    async fn test_records_processed_in_listing_order() {
        let records = [
            record(9, OWNER, "bogus"),
            // "cpu" as UCS-2
            record(2, "+221764489909", "006300700075"),
            record(5, OWNER, "HELP"),
        ];
        let (poller, mut channel, log, shell) = setup(&listing(&records), "12.5");

        let report = poller.poll_once(&mut channel).await.unwrap();
        assert_eq!(report.replies, 3);
        let replies = bodies(&log);
        assert_eq!(replies[0], UNKNOWN_COMMAND_REPLY);
        assert_eq!(replies[1], "Résultat de cpu:\n12.5");
        assert!(replies[2].starts_with("Liste des commandes:"));
        assert_eq!(
            sent(&log, "AT+CMGD"),
            vec!["AT+CMGD=9", "AT+CMGD=2", "AT+CMGD=5"]
        );
        assert_eq!(shell.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_cycle() {
        let (poller, _, _, _) = setup("", "");
        let mut broken = CommandChannel::new(
            ScriptedModem::new().failing(),
            ChannelTimings {
                command_wait: Duration::ZERO,
                listing_wait: Duration::ZERO,
            },
        );
        assert!(poller.poll_once(&mut broken).await.is_err());
    }
}
