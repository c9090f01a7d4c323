mod clean;
mod events;
mod feedback;
mod orchestrator;
mod planner;
mod request;
mod staleness;
mod utils;
mod watcher;

pub use clean::{clean, clean_objects};
pub use events::{BuildEvent, BuildFailure, BuildOutcome, BuildSummary, RunState};
pub use feedback::FeedbackAnalyzer;
pub use orchestrator::{BuildHandle, Orchestrator};
pub use planner::{BuildPlan, PlannedSource, plan};
pub use request::{BuildRequest, executable_name};
pub use staleness::{Staleness, needs_recompile};
pub use utils::{BuildOptions, discover_sources, load_config};
pub use watcher::watch;
