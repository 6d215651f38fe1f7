//! Subprocess execution for the external collaborators

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs one external command: pipes `input` to stdin and collects output
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    show_progress: bool,
}

impl CommandRunner {
    /// `command` is the program followed by its arguments
    pub fn new(command: &[String], timeout: Duration) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("External command is empty, check .docpilot/config.toml")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run with extra trailing arguments. Fails on spawn errors and timeouts;
    /// a non-zero exit is reported through [`CommandOutput::success`].
    pub async fn run(&self, extra_args: &[String], input: &str) -> Result<CommandOutput> {
        match tokio::time::timeout(self.timeout, self.run_inner(extra_args, input)).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!(
                "Command '{}' timed out after {}s",
                self.program,
                self.timeout.as_secs()
            ),
        }
    }

    /// Run and require a zero exit status, returning stdout
    pub async fn run_checked(&self, extra_args: &[String], input: &str) -> Result<String> {
        let output = self.run(extra_args, input).await?;
        if !output.success {
            anyhow::bail!(
                "Command '{}' failed with exit code {:?}\nStderr: {}",
                self.program,
                output.code,
                output.stderr.trim()
            );
        }
        Ok(output.stdout)
    }

    async fn run_inner(&self, extra_args: &[String], input: &str) -> Result<CommandOutput> {
        debug!(program = %self.program, args = ?self.args, "Spawning command");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let progress = self.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
            }
            pb.set_message(format!("Running {}...", self.program));
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        let mut child = cmd.spawn().with_context(|| {
            format!(
                "Command '{}' not found. Please ensure it is installed and in your PATH.",
                self.program
            )
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = match stdin.write_all(input.as_bytes()).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            };
            // A command may exit without reading its input
            if let Err(e) = written {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e).context("Failed to write to stdin");
                }
            }
        }

        // Drain both pipes concurrently so neither side blocks on a full buffer
        let stdout = child.stdout.take().context("Failed to capture stdout")?;
        let stderr = child.stderr.take().context("Failed to capture stderr")?;
        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let mut out = String::new();
        let mut err = String::new();
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !stdout_done || !stderr_done {
            tokio::select! {
                line = stdout_reader.next_line(), if !stdout_done => {
                    match line.context("Failed to read stdout")? {
                        Some(line) => {
                            out.push_str(&line);
                            out.push('\n');
                        }
                        None => stdout_done = true,
                    }
                }
                line = stderr_reader.next_line(), if !stderr_done => {
                    match line.context("Failed to read stderr")? {
                        Some(line) => {
                            err.push_str(&line);
                            err.push('\n');
                        }
                        None => stderr_done = true,
                    }
                }
            }
        }

        let status = child.wait().await?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout: out,
            stderr: err,
        })
    }
}
