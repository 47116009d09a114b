//! Host shell execution

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("command exited with status {code:?}")]
    NonZero { code: Option<i32>, output: String },

    #[error("failed to spawn shell: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Runs a shell command line and returns its combined output
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    async fn run(&self, command: &str) -> Result<String, ExecError>;
}

/// Executes through `sh -c`, stdout followed by stderr
pub struct SystemShell;

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn run(&self, command: &str) -> Result<String, ExecError> {
        info!("[SHELL] Running: {}", command);
        let out = Command::new("sh").arg("-c").arg(command).output().await?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        debug!("[SHELL] Raw output: {:?}", output);

        if out.status.success() {
            Ok(output)
        } else {
            Err(ExecError::NonZero {
                code: out.status.code(),
                output,
            })
        }
    }
}

/// Logs the command instead of running it
pub struct DryRunShell;

#[async_trait]
impl ShellExecutor for DryRunShell {
    async fn run(&self, command: &str) -> Result<String, ExecError> {
        info!("[SHELL] Dry run, not executing: {}", command);
        Ok(format!("(dry-run) {}", command))
    }
}
