//! subprocess adapter
//!
//! every external tool (docker, kubectl, helm, git, make, go, allorad) is
//! reached through [`CommandRunner`]. the environment a child needs is passed
//! explicitly in [`CommandSpec::env`]; the process environment of allocmd itself
//! is never mutated.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio as ProcessStdio};
use tracing::debug;

/// how the child's stdout/stderr are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stdio {
    /// collect both streams for parsing
    #[default]
    Capture,
    /// stream to the user's terminal
    Inherit,
    /// discard
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// overrides on top of the inherited environment, this child only
    pub env: BTreeMap<String, String>,
    /// written to the child's stdin, which is then closed
    pub stdin: Option<String>,
    pub stdio: Stdio,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn stdio(mut self, stdio: Stdio) -> Self {
        self.stdio = stdio;
        self
    }

    /// shell-like rendering for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the child was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr; some tools print their payload on either
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

pub trait CommandRunner {
    /// run to completion. a program that cannot be found is `DependencyMissing`;
    /// a non-zero exit is returned as output, not as an error
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// run and turn a non-zero exit into `Subprocess`
    fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(spec)?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::Subprocess {
                command: spec.display(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// whether `program` is callable at all, by running a harmless subcommand
    fn probe(&self, spec: &CommandSpec) -> bool {
        matches!(self.run(spec), Ok(output) if output.success())
    }
}

/// runs real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("exec: {}", spec.display());

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).envs(&spec.env);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        cmd.stdin(if spec.stdin.is_some() {
            ProcessStdio::piped()
        } else {
            ProcessStdio::inherit()
        });
        match spec.stdio {
            Stdio::Capture => {
                cmd.stdout(ProcessStdio::piped()).stderr(ProcessStdio::piped());
            }
            Stdio::Inherit => {
                cmd.stdout(ProcessStdio::inherit()).stderr(ProcessStdio::inherit());
            }
            Stdio::Null => {
                cmd.stdout(ProcessStdio::null()).stderr(ProcessStdio::null());
            }
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::DependencyMissing(format!(
                    "'{}' is not available in the system's PATH. please install it or check your PATH settings.",
                    spec.program
                ))
            } else {
                Error::Io(e)
            }
        })?;

        if let Some(input) = &spec.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes())?;
            }
        }

        let output = child.wait_with_output()?;
        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("exit: {:?} ({})", result.code, spec.program);
        Ok(result)
    }
}
