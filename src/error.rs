use std::path::PathBuf;

/// Errors that prevent a build run from starting or finishing.
///
/// Compile and link failures are not in here: they are a normal terminal
/// state of a run and come back as [`BuildOutcome::Failure`](crate::build::BuildOutcome).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no source files selected")]
    NoSources,

    #[error("no output directory given")]
    NoOutputDir,

    #[error("a build is already running")]
    RunInProgress,

    #[error("failed to prepare {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build worker panicked")]
    WorkerPanicked,
}
