use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::gate::{ConfirmationGate, GateDecision};
use crate::ui::GREEN;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> anyhow::Result<Capture>;
}

#[derive(Debug, Clone, Copy)]
pub enum EchoMode {
    Live,
    Silent,
}

#[derive(Debug, Clone, Copy)]
pub struct ShellRunner {
    echo: EchoMode,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            echo: EchoMode::Live,
        }
    }

    pub fn silent() -> Self {
        Self {
            echo: EchoMode::Silent,
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn drain_lines<R: AsyncRead + Unpin>(stream: R, echo: EchoMode, to_stderr: bool) -> String {
    let mut lines = BufReader::new(stream).lines();
    let mut captured = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if matches!(echo, EchoMode::Live) {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        captured.push_str(&line);
        captured.push('\n');
    }
    captured
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> anyhow::Result<Capture> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn shell for `{command}`"))?;

        let stdout = child.stdout.take().context("child stdout was not piped")?;
        let stderr = child.stderr.take().context("child stderr was not piped")?;

        // One drain task per channel; reading them in sequence can deadlock
        // once the unread pipe's buffer fills.
        let echo = self.echo;
        let out_task = tokio::spawn(drain_lines(stdout, echo, false));
        let err_task = tokio::spawn(drain_lines(stderr, echo, true));

        let stdout_text = out_task.await.context("stdout drain task panicked")?;
        let stderr_text = err_task.await.context("stderr drain task panicked")?;

        // Both channels are closed here, so wait() cannot lose output.
        child
            .wait()
            .await
            .with_context(|| format!("failed awaiting `{command}`"))?;

        Ok(Capture {
            stdout: stdout_text,
            stderr: stderr_text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Completed { stdout: String, stderr: String },
    Rejected { reason: String },
}

pub async fn dispatch(
    gate: &mut dyn ConfirmationGate,
    runner: &dyn CommandRunner,
    command: &str,
) -> CommandResult {
    let description = format!("Do you want to run the following command? {GREEN}{command}");
    match gate.confirm(&description) {
        GateDecision::Denied { reason } => {
            println!("Command execution cancelled.");
            CommandResult::Rejected { reason }
        }
        GateDecision::Approved => match runner.run(command).await {
            Ok(capture) => CommandResult::Completed {
                stdout: capture.stdout,
                stderr: capture.stderr,
            },
            Err(e) => {
                eprintln!("WARN: command could not be executed: {e:#}");
                CommandResult::Rejected {
                    reason: format!("command could not be executed: {e:#}"),
                }
            }
        },
    }
}

pub fn render_result(result: &CommandResult) -> String {
    match result {
        CommandResult::Completed { stdout, stderr } => {
            format!("STDOUT: {stdout}\nSTDERR: {stderr}")
        }
        CommandResult::Rejected { reason } => {
            format!("Command was not approved by user. Reason: {reason}")
        }
    }
}
