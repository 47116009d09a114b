//! Daemon configuration
//!
//! Loaded from a TOML file; every section and field is optional and falls
//! back to the defaults below.
//!
//! ```toml
//! [modem]
//! port = "/dev/ttyUSB2"
//!
//! [auth]
//! senders = ["+221777350027"]
//!
//! [[commands.queries]]
//! keyword = "temp"
//! command = "vcgencmd measure_temp"
//! ```

use crate::command::{ExecSettings, Lifecycle, HELP_KEYWORD};
use crate::modem::ChannelTimings;
use crate::transport::SerialConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use sms_admin_shared::timing;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("auth.senders is empty, nobody could use the daemon")]
    NoSenders,

    #[error("modem.baud must be greater than zero")]
    ZeroBaud,

    #[error("empty keyword in commands.queries")]
    EmptyKeyword,

    #[error("keyword {0:?} is defined more than once")]
    DuplicateKeyword(String),

    #[error("keyword {0:?} is reserved")]
    ReservedKeyword(String),

    #[error("keyword {0:?} has an empty command")]
    EmptyCommand(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub modem: ModemConfig,
    pub auth: AuthConfig,
    pub commands: CommandsConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub port: String,
    pub baud: u32,
    pub read_timeout_ms: u64,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            port: "/dev/serial0".into(),
            baud: 9600,
            read_timeout_ms: 1000,
        }
    }
}

/// Senders allowed to trigger any action, matched verbatim
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub senders: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            senders: vec!["+221777350027".into(), "+221764489909".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryCommand {
    pub keyword: String,
    pub command: String,
}

impl QueryCommand {
    fn new(keyword: &str, command: &str) -> Self {
        Self {
            keyword: keyword.into(),
            command: command.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Status queries, listed by `help` in this order
    pub queries: Vec<QueryCommand>,
    pub reboot: String,
    pub shutdown: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            queries: vec![
                QueryCommand::new("temp", "vcgencmd measure_temp"),
                QueryCommand::new("cpu", r#"top -bn1 | grep 'Cpu(s)' | awk '{print $2}'"#),
                QueryCommand::new(
                    "mem",
                    r#"free -m | grep 'Mem:' | awk '{print "Total: "$2"MB, Used: "$3"MB"}'"#,
                ),
                QueryCommand::new(
                    "disk",
                    r#"df -h / | tail -1 | awk '{print "Used: "$5 " of "$2}'"#,
                ),
                QueryCommand::new("uptime", "uptime -p"),
                QueryCommand::new(
                    "services",
                    "systemctl list-units --type=service --state=running | head -5",
                ),
            ],
            reboot: "sudo reboot".into(),
            shutdown: "sudo shutdown -h now".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub command_wait_ms: u64,
    pub listing_wait_ms: u64,
    pub poll_interval_ms: u64,
    pub error_backoff_ms: u64,
    pub lifecycle_ack_delay_ms: u64,
    pub max_output_chars: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            command_wait_ms: timing::COMMAND_WAIT_MS,
            listing_wait_ms: timing::LISTING_WAIT_MS,
            poll_interval_ms: timing::POLL_INTERVAL_MS,
            error_backoff_ms: timing::ERROR_BACKOFF_MS,
            lifecycle_ack_delay_ms: timing::LIFECYCLE_ACK_DELAY_MS,
            max_output_chars: timing::MAX_OUTPUT_CHARS,
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl AppConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&input)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.senders.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::NoSenders);
        }
        if self.modem.baud == 0 {
            return Err(ConfigError::ZeroBaud);
        }

        let reserved = [
            HELP_KEYWORD,
            Lifecycle::Reboot.keyword(),
            Lifecycle::Shutdown.keyword(),
        ];
        let mut seen = HashSet::new();
        for query in &self.commands.queries {
            let keyword = query.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(ConfigError::EmptyKeyword);
            }
            if reserved.contains(&keyword.as_str()) {
                return Err(ConfigError::ReservedKeyword(keyword));
            }
            if query.command.trim().is_empty() {
                return Err(ConfigError::EmptyCommand(keyword));
            }
            if !seen.insert(keyword.clone()) {
                return Err(ConfigError::DuplicateKeyword(keyword));
            }
        }
        for (op, command) in [
            (Lifecycle::Reboot, &self.commands.reboot),
            (Lifecycle::Shutdown, &self.commands.shutdown),
        ] {
            if command.trim().is_empty() {
                return Err(ConfigError::EmptyCommand(op.keyword().into()));
            }
        }
        Ok(())
    }

    pub fn serial(&self) -> SerialConfig {
        SerialConfig {
            port: self.modem.port.clone(),
            baud: self.modem.baud,
            read_timeout: Duration::from_millis(self.modem.read_timeout_ms),
        }
    }

    pub fn channel_timings(&self) -> ChannelTimings {
        ChannelTimings {
            command_wait: Duration::from_millis(self.timing.command_wait_ms),
            listing_wait: Duration::from_millis(self.timing.listing_wait_ms),
        }
    }

    pub fn exec_settings(&self) -> ExecSettings {
        ExecSettings {
            ack_delay: Duration::from_millis(self.timing.lifecycle_ack_delay_ms),
            max_output_chars: self.timing.max_output_chars,
        }
    }
}
