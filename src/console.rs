//! Styled console reporting and the confirmation gate.
//!
//! The console is an explicitly constructed interface handed to the
//! orchestrator and every step, never process-wide state, so tests can swap
//! in a double that captures output and scripts answers.
//!
//! Confirmation semantics: the default answer on empty input is yes; EOF or
//! any non-affirmative input is no. When stdin is not a terminal the gate
//! fails fast with `NonInteractive` instead of hanging an unattended run;
//! a confirmation is never assumed true without an operator.

use crate::error::{ProvisionError, Result};
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Reporting surface plus confirmation gate for one provisioning run.
pub trait Console {
    /// Opening banner with the operator's name.
    fn banner(&mut self, title: &str, operator: &str);

    /// Section heading announcing a step.
    fn section(&mut self, text: &str);

    /// Progress narration for an in-flight action.
    fn info(&mut self, text: &str);

    /// A completed or already-satisfied action.
    fn success(&mut self, text: &str);

    /// A recoverable problem; the run continues.
    fn warn(&mut self, text: &str);

    /// A failed action or step.
    fn error(&mut self, text: &str);

    /// Block for a yes/no answer to `prompt`.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;

    /// Block for a free-text answer to `prompt`. EOF yields an empty string.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Block until the operator acknowledges; used before a fatal exit so
    /// the diagnostic context does not vanish with the window.
    fn pause(&mut self, prompt: &str) -> Result<()>;
}

/// Empty input takes the prompt's default; `y` and `yes` are the explicit
/// affirmatives, anything else declines.
fn is_affirmative(answer: &str) -> bool {
    answer.is_empty() || answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Interactive console writing styled output to stdout and reading answers
/// from stdin.
pub struct TermConsole {
    interactive: bool,
}

impl TermConsole {
    pub fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_tty(),
        }
    }

    fn read_line(&self) -> Result<Option<String>> {
        let mut line = String::new();
        let bytes = std::io::stdin().lock().read_line(&mut line)?;
        if bytes == 0 {
            // EOF: treated as a negative answer, not an error.
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl Default for TermConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TermConsole {
    fn banner(&mut self, title: &str, operator: &str) {
        println!();
        println!("{}", format!("~~~ {} ~~~", title).magenta().bold());
        println!("{}", format!("Operator: {}", operator).dark_grey());
        println!();
    }

    fn section(&mut self, text: &str) {
        println!();
        println!("{}", text.magenta());
    }

    fn info(&mut self, text: &str) {
        println!("{}", format!("  > {}", text).cyan().dim());
    }

    fn success(&mut self, text: &str) {
        println!("{}", format!("  + {}", text).green().bold());
    }

    fn warn(&mut self, text: &str) {
        println!("{}", format!("  ! {}", text).yellow());
    }

    fn error(&mut self, text: &str) {
        println!("{}", format!("  ! {}", text).red().bold());
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if !self.interactive {
            return Err(ProvisionError::NonInteractive);
        }
        print!("{} {} ", prompt.magenta(), "[Y/n]".dark_grey());
        std::io::stdout().flush()?;

        match self.read_line()? {
            None => Ok(false),
            Some(answer) => Ok(is_affirmative(&answer)),
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        if !self.interactive {
            return Err(ProvisionError::NonInteractive);
        }
        print!("{} ", prompt.magenta());
        std::io::stdout().flush()?;
        Ok(self.read_line()?.unwrap_or_default())
    }

    fn pause(&mut self, prompt: &str) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }
        print!("{} ", prompt.dark_grey());
        std::io::stdout().flush()?;
        let _ = self.read_line()?;
        Ok(())
    }
}

/// Console double for tests: captures every line and plays back scripted
/// confirmation answers.
#[derive(Debug, Default)]
pub struct CapturedConsole {
    pub lines: Vec<String>,
    pub prompts: Vec<String>,
    answers: VecDeque<bool>,
    replies: VecDeque<String>,
    non_interactive: bool,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the answers returned by successive `confirm` calls.
    /// When the queue runs dry, `confirm` answers yes (the default).
    pub fn with_answers(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Script the text returned by successive `ask` calls.
    /// When the queue runs dry, `ask` returns an empty string.
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Make `confirm` fail with `NonInteractive`, simulating a detached run.
    pub fn detached() -> Self {
        Self {
            non_interactive: true,
            ..Self::default()
        }
    }

    /// True if any captured line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Console for CapturedConsole {
    fn banner(&mut self, title: &str, operator: &str) {
        self.lines.push(format!("banner: {} ({})", title, operator));
    }

    fn section(&mut self, text: &str) {
        self.lines.push(format!("section: {}", text));
    }

    fn info(&mut self, text: &str) {
        self.lines.push(format!("info: {}", text));
    }

    fn success(&mut self, text: &str) {
        self.lines.push(format!("success: {}", text));
    }

    fn warn(&mut self, text: &str) {
        self.lines.push(format!("warn: {}", text));
    }

    fn error(&mut self, text: &str) {
        self.lines.push(format!("error: {}", text));
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.non_interactive {
            return Err(ProvisionError::NonInteractive);
        }
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front().unwrap_or(true))
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        if self.non_interactive {
            return Err(ProvisionError::NonInteractive);
        }
        self.prompts.push(prompt.to_string());
        Ok(self.replies.pop_front().unwrap_or_default())
    }

    fn pause(&mut self, prompt: &str) -> Result<()> {
        self.prompts.push(prompt.to_string());
        Ok(())
    }
}
