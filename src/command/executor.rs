//! Command executor - resolves and dispatches admin commands

use super::handlers::{self, HandlerContext};
use super::registry::{ActionKind, Resolution};
use super::{CommandRegistry, UNKNOWN_COMMAND_REPLY};
use super::shell::ShellExecutor;
use crate::modem::Notifier;
use sms_admin_shared::timing;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Send this text back to the sender
    Reply { message: String },
    /// Nothing to send (distinct from an empty reply)
    NoReply,
}

#[derive(Debug, Clone)]
pub struct ExecSettings {
    /// Pause between a lifecycle acknowledgement and the command
    pub ack_delay: Duration,
    /// Output characters kept in a status reply
    pub max_output_chars: usize,
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            ack_delay: Duration::from_millis(timing::LIFECYCLE_ACK_DELAY_MS),
            max_output_chars: timing::MAX_OUTPUT_CHARS,
        }
    }
}

/// Executes commands from authorized senders
pub struct CommandExecutor {
    registry: CommandRegistry,
    shell: Arc<dyn ShellExecutor>,
    settings: ExecSettings,
}

impl CommandExecutor {
    pub fn new(registry: CommandRegistry, shell: Arc<dyn ShellExecutor>, settings: ExecSettings) -> Self {
        Self {
            registry,
            shell,
            settings,
        }
    }

    /// Execute a decoded message body. The sender must already be authorized.
    pub async fn execute<N: Notifier + ?Sized>(
        &self,
        text: &str,
        sender: &str,
        notifier: &mut N,
    ) -> CommandResult {
        let action = match self.registry.resolve(text) {
            Resolution::Known(action) => action,
            Resolution::Unknown { keyword } => {
                info!("Unknown command {:?} from {}", keyword, sender);
                return CommandResult::Reply {
                    message: UNKNOWN_COMMAND_REPLY.into(),
                };
            }
        };

        info!("Executing command: {} for {}", action.keyword, sender);

        let ctx = HandlerContext {
            sender,
            keyword: &action.keyword,
            shell: self.shell.as_ref(),
            max_output_chars: self.settings.max_output_chars,
            ack_delay: self.settings.ack_delay,
        };

        match &action.kind {
            ActionKind::Query { command } => {
                let template = action.reply_template.as_deref().unwrap_or_default();
                handlers::handle_status_query(&ctx, command, template).await
            }
            ActionKind::Lifecycle { op, command } => {
                handlers::handle_lifecycle(&ctx, *op, command, notifier).await
            }
            ActionKind::Help => handlers::handle_help(&self.registry),
        }
    }
}
