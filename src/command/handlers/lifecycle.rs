//! Reboot and shutdown handler

use super::HandlerContext;
use crate::command::{CommandResult, Lifecycle};
use crate::modem::Notifier;
use tracing::{error, warn};

/// Handle REBOOT / SHUTDOWN.
///
/// The acknowledgement goes out first, with a pause so the modem can
/// transmit it before the host stops answering. No reply follows.
pub async fn handle_lifecycle<N: Notifier + ?Sized>(
    ctx: &HandlerContext<'_>,
    op: Lifecycle,
    command: &str,
    notifier: &mut N,
) -> CommandResult {
    warn!("  [{}] Requested by {}", op.keyword().to_uppercase(), ctx.sender);

    match notifier.notify(ctx.sender, op.acknowledgement()).await {
        Ok(true) => {}
        Ok(false) => warn!("  [{}] Acknowledgement not confirmed by modem", op.keyword()),
        Err(e) => error!("  [{}] Failed to send acknowledgement: {:#}", op.keyword(), e),
    }

    tokio::time::sleep(ctx.ack_delay).await;

    if let Err(e) = ctx.shell.run(command).await {
        error!("  [{}] Command failed: {}", op.keyword(), e);
    }

    CommandResult::NoReply
}
