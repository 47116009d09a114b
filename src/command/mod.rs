//! Command execution infrastructure for the SMS admin daemon
//!
//! This module handles:
//! - Resolving a decoded message body to an admin action
//! - Dispatching to the matching handler
//! - Running shell commands on the host
//! - Building the reply text sent back to the operator

mod executor;
pub mod handlers;
mod registry;
mod shell;

pub use executor::{CommandExecutor, CommandResult, ExecSettings};
pub use registry::{CommandRegistry, Lifecycle, HELP_KEYWORD, UNKNOWN_COMMAND_REPLY};
pub use shell::{DryRunShell, ExecError, ShellExecutor, SystemShell};

#[cfg(test)]
pub(crate) use executor::testing;
