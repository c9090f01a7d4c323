use super::staleness::Staleness;
use crate::toolchain::{Stage, ToolchainError};
use std::path::{Path, PathBuf};

/// Orchestrator states, in the order a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Loading,
    Cleaning,
    Compiling,
    Linking,
    Saving,
    Done,
}

/// One entry of the ordered progress stream of a run.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    State(RunState),
    Info(String),
    /// Non-fatal problem (manifest storage, unreadable source, name clash).
    Warning(String),
    Decision {
        source: PathBuf,
        staleness: Staleness,
    },
    CompileStarted {
        source: PathBuf,
        command: String,
    },
    /// `stderr` holds compiler warnings, if any.
    Compiled {
        source: PathBuf,
        stderr: String,
    },
    CompileFailed(ToolchainError),
    LinkStarted {
        exe: PathBuf,
        command: String,
    },
    Linked {
        exe: PathBuf,
        stderr: String,
    },
    LinkFailed(ToolchainError),
    LinkSkipped,
    Finished(BuildOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub exe_path: PathBuf,
    pub recompiled: usize,
    pub skipped: usize,
    pub linked: bool,
}

#[derive(Debug, Clone)]
pub struct BuildFailure {
    pub error: ToolchainError,
    pub recompiled: usize,
    pub skipped: usize,
}

impl BuildFailure {
    pub fn stage(&self) -> Stage {
        self.error.stage
    }

    pub fn path(&self) -> Option<&Path> {
        self.error.path.as_deref()
    }

    pub fn stderr(&self) -> &str {
        &self.error.stderr
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    Success(BuildSummary),
    Failure(BuildFailure),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success(_))
    }

    pub fn summary(&self) -> Option<&BuildSummary> {
        match self {
            BuildOutcome::Success(s) => Some(s),
            BuildOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&BuildFailure> {
        match self {
            BuildOutcome::Success(_) => None,
            BuildOutcome::Failure(f) => Some(f),
        }
    }
}
