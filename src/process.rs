//! Synchronous external process invocation.
//!
//! Every external-tool interaction (winget, PowerShell, reg.exe, npm) goes
//! through the `ProcessRunner` trait so steps can be exercised against a
//! recording fake in tests. The real runner blocks until the child exits and
//! captures both output streams as text.
//!
//! A non-zero exit code is a normal, reportable outcome, not an `Err`; only a
//! failure to spawn the child at all produces an error. No timeout is
//! enforced: a hung external tool hangs the run, which is acceptable for an
//! interactive, human-attended tool (known limitation).

use crate::error::Result;
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of a single external process invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Exit code (None if terminated by a signal).
    pub exit_code: Option<i32>,
    /// Whether the process exited successfully (exit code 0).
    pub success: bool,
}

impl CommandOutput {
    /// Build an output value directly; used by fakes and tests.
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            success: exit_code == 0,
        }
    }

    /// Convert a non-zero exit into an `ExternalTool` error, keeping the
    /// stderr tail as context.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            Err(crate::error::ProvisionError::external_tool(format!(
                "{} (exit code {}): {}",
                context,
                code,
                self.stderr.trim()
            )))
        }
    }
}

/// The execution boundary for external command-line tools.
///
/// Implementations must spawn exactly one child per call and block until it
/// exits. `run` returns `Err` only when the child could not be spawned.
pub trait ProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run an ad-hoc PowerShell script. Used only for operations with no
    /// direct native equivalent (SMB shares, font installation via the COM
    /// shell object, wallpaper application, Explorer restart).
    fn run_powershell(&self, script: &str) -> Result<CommandOutput> {
        self.run("powershell", &["-NoProfile", "-Command", script])
    }
}

/// `ProcessRunner` backed by `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!("spawning: {} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        };
        debug!("{} exited with {:?}", program, result.exit_code);
        Ok(result)
    }
}

/// A recording fake runner for tests.
///
/// Responses are matched by program name, in order of registration; anything
/// unmatched succeeds with empty output. Every invocation is recorded so
/// tests can assert that declining a confirmation spawned nothing.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: std::sync::Mutex<Vec<(String, CommandOutput)>>,
    invocations: std::sync::Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned response for the next invocation of `program`.
    pub fn respond(&self, program: &str, output: CommandOutput) {
        self.responses
            .lock()
            .expect("ScriptedRunner mutex poisoned")
            .push((program.to_string(), output));
    }

    /// Full command lines observed so far (program followed by args).
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations
            .lock()
            .expect("ScriptedRunner mutex poisoned")
            .clone()
    }

    /// Number of processes this runner was asked to spawn.
    pub fn spawn_count(&self) -> usize {
        self.invocations
            .lock()
            .expect("ScriptedRunner mutex poisoned")
            .len()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let mut line = vec![program.to_string()];
        line.extend(args.iter().map(|a| a.to_string()));
        self.invocations
            .lock()
            .expect("ScriptedRunner mutex poisoned")
            .push(line);

        let mut responses = self
            .responses
            .lock()
            .expect("ScriptedRunner mutex poisoned");
        if let Some(pos) = responses.iter().position(|(p, _)| p == program) {
            let (_, output) = responses.remove(pos);
            return Ok(output);
        }
        Ok(CommandOutput::new(0, "", ""))
    }
}
