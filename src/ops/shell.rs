use std::borrow::Cow;
use std::process::{Command, Stdio};

use super::Context;
use crate::error::{ExternalToolError, InvalidTaskError};

/// Runs a command line through the platform shell in the project root.
#[derive(Debug, Clone)]
pub struct ShellTask {
    command: String,
    stdout: bool,
}

impl ShellTask {
    /// With `stdout` unset the command's standard output is discarded;
    /// standard error always reaches the terminal.
    pub fn new(command: impl Into<String>, stdout: bool) -> Result<Self, InvalidTaskError> {
        let command = command.into();

        if command.trim().is_empty() {
            return Err(InvalidTaskError::EmptyCommand);
        }

        Ok(Self { command, stdout })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn streams_stdout(&self) -> bool {
        self.stdout
    }

    pub(crate) fn run(&self, cx: &Context<'_>) -> Result<(), ExternalToolError> {
        let mut command = shell(&self.command);
        command
            .current_dir(cx.root)
            .stdin(Stdio::null())
            .stdout(if self.stdout {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::inherit());

        tracing::debug!("Running `{}` in {}", self.command, cx.root);

        let status = tracing_indicatif::suspend_tracing_indicatif(|| command.status())
            .map_err(|e| ExternalToolError::Spawn(self.command.clone(), e))?;

        if !status.success() {
            return Err(ExternalToolError::Command(self.command.clone(), status));
        }

        Ok(())
    }
}

#[cfg(not(windows))]
fn shell(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(windows)]
fn shell(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

/// Quote a single word for the platform shell when it needs it.
pub(crate) fn quote(word: &str) -> Cow<'_, str> {
    let plain = |c: char| c.is_ascii_alphanumeric() || "/\\._-+:=@%,".contains(c);

    if !word.is_empty() && word.chars().all(plain) {
        return Cow::Borrowed(word);
    }

    if cfg!(windows) {
        Cow::Owned(format!("\"{}\"", word.replace('"', "\"\"")))
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
    }
}
