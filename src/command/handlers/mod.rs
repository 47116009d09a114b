//! Command handlers for the different action kinds

mod help;
mod lifecycle;
mod status;

pub use help::handle_help;
pub use lifecycle::handle_lifecycle;
pub use status::handle_status_query;

use crate::command::ShellExecutor;
use std::time::Duration;

/// Context passed to command handlers
pub struct HandlerContext<'a> {
    /// Authorized sender the command came from
    pub sender: &'a str,
    pub keyword: &'a str,
    pub shell: &'a dyn ShellExecutor,
    pub max_output_chars: usize,
    pub ack_delay: Duration,
}

/// First `max` characters of the trimmed text
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.trim().chars().take(max).collect()
}
