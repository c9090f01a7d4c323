use std::fmt;
use std::path::PathBuf;

/// Which toolchain step produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Link,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => write!(f, "compile"),
            Stage::Link => write!(f, "link"),
        }
    }
}

/// A program plus its ordered arguments. Built fresh for every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolchainCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
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
}

impl fmt::Display for ToolchainCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// A compile or link step failed. Always fatal to the current run.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} failed{}", .path.as_ref().map(|p| format!(" for {}", p.display())).unwrap_or_default())]
pub struct ToolchainError {
    pub stage: Stage,
    /// Source file being compiled; `None` for link failures.
    pub path: Option<PathBuf>,
    /// Captured stderr, or the OS error when the compiler could not be started.
    pub stderr: String,
}
