//! Help handler

use crate::command::{CommandRegistry, CommandResult};

pub fn handle_help(registry: &CommandRegistry) -> CommandResult {
    CommandResult::Reply {
        message: registry.help_text().to_string(),
    }
}
