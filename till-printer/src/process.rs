//! External process invocation
//!
//! Spooler queries and print commands go through [`CommandRunner`] so they
//! can be replaced in tests.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// Captured output of a successful command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program to completion
///
/// Implementations return `Err(CommandError::Failed)` for a non-zero exit.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError>;
}

/// Runs commands on the host with `tokio::process`
///
/// A command abandoned by a timeout is not killed; it may keep running in
/// the background.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            // CREATE_NO_WINDOW
            cmd.creation_flags(0x0800_0000);
        }

        let output = cmd.output().await.map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !stdout.trim().is_empty() {
            debug!(program, stdout = %stdout.trim(), "command stdout");
        }
        if !stderr.trim().is_empty() {
            debug!(program, stderr = %stderr.trim(), "command stderr");
        }

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

/// Run a command with a deadline; an elapsed deadline is reported as
/// [`CommandError::TimedOut`]
pub async fn run_with_timeout(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    tokio::time::timeout(timeout, runner.run(program, args))
        .await
        .map_err(|_| CommandError::TimedOut {
            program: program.to_string(),
            millis: timeout.as_millis(),
        })?
}

/// Quote a value for a PowerShell single-quoted string literal
pub fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait]
    impl CommandRunner for Slow {
        async fn run(&self, _: &str, _: &[String]) -> Result<CommandOutput, CommandError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(CommandOutput::default())
        }
    }

    #[test]
    fn test_ps_quote() {
        assert_eq!(ps_quote("POS-80"), "'POS-80'");
        assert_eq!(ps_quote("Bob's Printer"), "'Bob''s Printer'");
    }

    #[tokio::test]
    async fn test_run_with_timeout_elapses() {
        let err = run_with_timeout(&Slow, "slow", &[], Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { millis: 20, .. }));
    }
}
