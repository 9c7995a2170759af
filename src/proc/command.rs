//! External command execution with captured output.
//!
//! Every invocation returns a [`CmdOutcome`] whether or not the child
//! succeeded; a non-zero exit is data, not an error. Call sites decide what
//! matters via [`run_logged`]'s `failok` flag. The only hard failure is a
//! spawn error (missing binary, permissions), and even that is tolerated by
//! the control loop.

use std::process::{Command, Stdio};

use crate::core::errors::{Result, WrError};

/// Exit status plus combined stdout/stderr of a finished command.
#[derive(Debug, Clone)]
pub struct CmdOutcome {
    /// Child exit code; -1 when the child was killed by a signal.
    pub status: i32,
    /// Captured stdout followed by stderr.
    pub output: String,
}

impl CmdOutcome {
    /// Whether the child exited zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Seam for invoking collaborator tools. Production uses [`SystemRunner`];
/// tests substitute scripted fakes.
pub trait CommandRunner {
    /// Execute `argv[0]` with the remaining arguments, capturing output.
    fn run(&self, argv: &[String]) -> Result<CmdOutcome>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<CmdOutcome> {
        let Some((program, rest)) = argv.split_first() else {
            return Err(WrError::InvalidConfig {
                details: "empty command line".to_string(),
            });
        };
        let out = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| WrError::Spawn {
                command: program.clone(),
                source,
            })?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        Ok(CmdOutcome {
            status: out.status.code().unwrap_or(-1),
            output,
        })
    }
}

/// Run a command and log its failure unless the caller tolerates it.
///
/// The outcome is always returned; logging is the only difference between
/// tolerated and required calls.
pub fn run_logged(
    runner: &dyn CommandRunner,
    argv: &[String],
    failok: bool,
) -> Result<CmdOutcome> {
    let outcome = runner.run(argv)?;
    if outcome.success() {
        tracing::debug!(command = %argv.join(" "), "executed");
    } else if !failok {
        tracing::error!(
            command = %argv.join(" "),
            status = outcome.status,
            output = %outcome.output.trim(),
            "command failed"
        );
    }
    Ok(outcome)
}

/// Build an argv from a program and string-like arguments.
#[must_use]
pub fn argv(program: &str, args: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 1);
    out.push(program.to_string());
    out.extend(args.iter().map(|a| (*a).to_string()));
    out
}
