//! Status query handler

use super::{truncate_chars, HandlerContext};
use crate::command::{CommandResult, ExecError};

/// Run a status command and wrap its output in the reply template.
///
/// Failures are reported to the operator rather than hidden.
pub async fn handle_status_query(
    ctx: &HandlerContext<'_>,
    command: &str,
    template: &str,
) -> CommandResult {
    let output = match ctx.shell.run(command).await {
        Ok(output) => output,
        Err(ExecError::NonZero { output, .. }) => format!("Erreur: {}", output.trim()),
        Err(e) => format!("Erreur système: {}", e),
    };

    let output = truncate_chars(&output, ctx.max_output_chars);
    tracing::info!("  [{}] Result: {:?}", ctx.keyword, output);

    CommandResult::Reply {
        message: format!("{}{}", template, output),
    }
}
