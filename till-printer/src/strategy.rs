//! Queue print strategies
//!
//! Each strategy is one way of getting a text file onto a spooler queue.
//! The executor tries them in order and stops at the first success.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StrategyError;
use crate::process::{CommandRunner, ps_quote};

/// One queue print job
#[derive(Debug, Clone, Copy)]
pub struct QueueJob<'a> {
    /// Spooler queue name
    pub queue: &'a str,
    /// Temp file holding `content`
    pub file: &'a Path,
    /// Formatted receipt text
    pub content: &'a str,
}

/// When the executor removes the temp file after this strategy succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    /// After the configured grace delay; the spooler may still be reading it
    Deferred,
    /// Right away; the strategy does not read the file
    Immediate,
}

#[async_trait]
pub trait QueueStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Per-attempt deadline. `None` runs the attempt unbounded.
    fn timeout(&self) -> Option<Duration>;

    fn cleanup(&self) -> Cleanup {
        Cleanup::Deferred
    }

    async fn attempt(&self, job: QueueJob<'_>) -> Result<(), StrategyError>;
}

/// The platform's ordered strategy chain
#[cfg(windows)]
pub fn default_chain(
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
) -> Vec<Box<dyn QueueStrategy>> {
    vec![
        Box::new(OutPrinter::new(runner.clone(), timeout)),
        Box::new(LegacyPrint::new(runner.clone(), timeout)),
        Box::new(ShellPrintTo::new(runner, timeout)),
        Box::new(NativeRaw),
    ]
}

/// The platform's ordered strategy chain
#[cfg(not(windows))]
pub fn default_chain(
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
) -> Vec<Box<dyn QueueStrategy>> {
    vec![
        Box::new(CupsLp::new(runner.clone(), timeout)),
        Box::new(CupsLpr::new(runner, timeout)),
    ]
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

macro_rules! command_strategy {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        pub struct $ty {
            runner: Arc<dyn CommandRunner>,
            timeout: Duration,
        }

        impl $ty {
            pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
                Self { runner, timeout }
            }
        }
    };
}

// ============================================================================
// Windows
// ============================================================================

command_strategy!(
    /// PowerShell: stream the file's raw content to `Out-Printer`
    OutPrinter
);

impl OutPrinter {
    pub fn command(job: &QueueJob<'_>) -> (String, Vec<String>) {
        let script = format!(
            "Get-Content -Raw -Path {} | Out-Printer -Name {}",
            ps_quote(&path_arg(job.file)),
            ps_quote(job.queue)
        );
        (
            "powershell".to_string(),
            vec!["-NoProfile".into(), "-Command".into(), script],
        )
    }
}

#[async_trait]
impl QueueStrategy for OutPrinter {
    fn name(&self) -> &'static str {
        "out-printer"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn attempt(&self, job: QueueJob<'_>) -> Result<(), StrategyError> {
        let (program, args) = Self::command(&job);
        self.runner.run(&program, &args).await?;
        Ok(())
    }
}

command_strategy!(
    /// Legacy `print /D:<queue> <file>`
    LegacyPrint
);

impl LegacyPrint {
    pub fn command(job: &QueueJob<'_>) -> (String, Vec<String>) {
        (
            "print".to_string(),
            vec![format!("/D:{}", job.queue), path_arg(job.file)],
        )
    }
}

#[async_trait]
impl QueueStrategy for LegacyPrint {
    fn name(&self) -> &'static str {
        "print-command"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn attempt(&self, job: QueueJob<'_>) -> Result<(), StrategyError> {
        let (program, args) = Self::command(&job);
        self.runner.run(&program, &args).await?;
        Ok(())
    }
}

command_strategy!(
    /// Shell `PrintTo` verb via `Start-Process`
    ShellPrintTo
);

impl ShellPrintTo {
    pub fn command(job: &QueueJob<'_>) -> (String, Vec<String>) {
        let script = format!(
            "Start-Process -FilePath {} -Verb PrintTo -ArgumentList {}",
            ps_quote(&path_arg(job.file)),
            ps_quote(job.queue)
        );
        (
            "powershell".to_string(),
            vec!["-NoProfile".into(), "-Command".into(), script],
        )
    }
}

#[async_trait]
impl QueueStrategy for ShellPrintTo {
    fn name(&self) -> &'static str {
        "shell-print-to"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn attempt(&self, job: QueueJob<'_>) -> Result<(), StrategyError> {
        let (program, args) = Self::command(&job);
        self.runner.run(&program, &args).await?;
        Ok(())
    }
}

/// ESC/POS-encode the content and submit it as a RAW spooler job
#[cfg(windows)]
pub struct NativeRaw;

#[cfg(windows)]
#[async_trait]
impl QueueStrategy for NativeRaw {
    fn name(&self) -> &'static str {
        "native-raw"
    }

    fn timeout(&self) -> Option<Duration> {
        None
    }

    fn cleanup(&self) -> Cleanup {
        Cleanup::Immediate
    }

    async fn attempt(&self, job: QueueJob<'_>) -> Result<(), StrategyError> {
        let queue = job.queue.to_string();
        let data = crate::escpos::encode(job.content);

        tokio::task::spawn_blocking(move || crate::native::write_raw(&queue, &data))
            .await
            .map_err(|e| StrategyError::Native(format!("Task join failed: {}", e)))?
            .map_err(StrategyError::Native)
    }
}

// ============================================================================
// CUPS
// ============================================================================

command_strategy!(
    /// `lp -d <queue> <file>`
    CupsLp
);

impl CupsLp {
    pub fn command(job: &QueueJob<'_>) -> (String, Vec<String>) {
        (
            "lp".to_string(),
            vec!["-d".into(), job.queue.to_string(), path_arg(job.file)],
        )
    }
}

#[async_trait]
impl QueueStrategy for CupsLp {
    fn name(&self) -> &'static str {
        "lp"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn attempt(&self, job: QueueJob<'_>) -> Result<(), StrategyError> {
        let (program, args) = Self::command(&job);
        self.runner.run(&program, &args).await?;
        Ok(())
    }
}

command_strategy!(
    /// `lpr -P <queue> <file>`
    CupsLpr
);

impl CupsLpr {
    pub fn command(job: &QueueJob<'_>) -> (String, Vec<String>) {
        (
            "lpr".to_string(),
            vec!["-P".into(), job.queue.to_string(), path_arg(job.file)],
        )
    }
}

#[async_trait]
impl QueueStrategy for CupsLpr {
    fn name(&self) -> &'static str {
        "lpr"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn attempt(&self, job: QueueJob<'_>) -> Result<(), StrategyError> {
        let (program, args) = Self::command(&job);
        self.runner.run(&program, &args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;
    use crate::process::CommandOutput;
    use parking_lot::Mutex;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
            self.calls.lock().push((program.to_string(), args.to_vec()));
            Ok(CommandOutput::default())
        }
    }

    fn job(file: &Path) -> QueueJob<'_> {
        QueueJob {
            queue: "Bob's POS-80",
            file,
            content: "hello\r\n",
        }
    }

    #[test]
    fn test_out_printer_command() {
        let file = PathBuf::from(r"C:\temp\print_1.txt");
        let (program, args) = OutPrinter::command(&job(&file));
        assert_eq!(program, "powershell");
        assert_eq!(args[..2], ["-NoProfile", "-Command"]);
        assert_eq!(
            args[2],
            r"Get-Content -Raw -Path 'C:\temp\print_1.txt' | Out-Printer -Name 'Bob''s POS-80'"
        );
    }

    #[test]
    fn test_legacy_print_command() {
        let file = PathBuf::from(r"C:\temp\print_1.txt");
        let (program, args) = LegacyPrint::command(&job(&file));
        assert_eq!(program, "print");
        assert_eq!(args, vec![r"/D:Bob's POS-80", r"C:\temp\print_1.txt"]);
    }

    #[test]
    fn test_shell_print_to_command() {
        let file = PathBuf::from(r"C:\temp\print_1.txt");
        let (_, args) = ShellPrintTo::command(&job(&file));
        assert_eq!(
            args[2],
            r"Start-Process -FilePath 'C:\temp\print_1.txt' -Verb PrintTo -ArgumentList 'Bob''s POS-80'"
        );
    }

    #[tokio::test]
    async fn test_cups_strategies_run_commands() {
        let recorder = Arc::new(Recorder::default());
        let file = PathBuf::from("/tmp/print_1.txt");

        CupsLp::new(recorder.clone(), Duration::from_secs(1))
            .attempt(job(&file))
            .await
            .unwrap();
        CupsLpr::new(recorder.clone(), Duration::from_secs(1))
            .attempt(job(&file))
            .await
            .unwrap();

        let calls = recorder.calls.lock();
        assert_eq!(calls[0].0, "lp");
        assert_eq!(calls[0].1, vec!["-d", "Bob's POS-80", "/tmp/print_1.txt"]);
        assert_eq!(calls[1].0, "lpr");
        assert_eq!(calls[1].1, vec!["-P", "Bob's POS-80", "/tmp/print_1.txt"]);
    }
}
