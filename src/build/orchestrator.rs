//! Sequencing of a single build run.
//!
//! A run moves through `Loading -> (Cleaning) -> Compiling -> Linking ->
//! Saving -> Done`. Compilation is sequential and stops at the first failing
//! translation unit; linking is skipped after any compile failure. The
//! manifest is saved on every path that reaches `Saving`, so compiles that
//! did succeed before a failure are remembered.

use super::clean::clean_objects;
use super::events::{BuildEvent, BuildFailure, BuildOutcome, BuildSummary, RunState};
use super::planner;
use super::request::BuildRequest;
use crate::error::BuildError;
use crate::hash::ContentHash;
use crate::manifest::{Manifest, ManifestStore};
use crate::toolchain::{CommandRunner, ProcessRunner, Toolchain, ToolchainError};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;

/// Runs builds, at most one at a time.
///
/// Clones share the same run guard, so starting a build from any clone while
/// another is active fails with [`BuildError::RunInProgress`]. The guard is
/// per instance: two separately constructed orchestrators do not exclude each
/// other, so callers sharing an output directory must share one orchestrator.
pub struct Orchestrator<R = ProcessRunner> {
    runner: Arc<R>,
    active: Arc<AtomicBool>,
}

impl<R> Clone for Orchestrator<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            active: Arc::clone(&self.active),
        }
    }
}

impl Default for Orchestrator<ProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator<ProcessRunner> {
    pub fn new() -> Self {
        Self::with_runner(ProcessRunner)
    }
}

/// A build running on its worker thread.
pub struct BuildHandle {
    events: Receiver<BuildEvent>,
    worker: JoinHandle<Result<BuildOutcome, BuildError>>,
}

impl BuildHandle {
    /// Ordered progress events. The stream ends when the worker finishes.
    pub fn events(&self) -> &Receiver<BuildEvent> {
        &self.events
    }

    /// Waits for the worker. Events not yet received are dropped.
    pub fn join(self) -> Result<BuildOutcome, BuildError> {
        self.worker.join().map_err(|_| BuildError::WorkerPanicked)?
    }
}

impl<R: CommandRunner + 'static> Orchestrator<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Starts `request` on a dedicated worker thread.
    ///
    /// Input errors and a busy orchestrator are reported here, before any
    /// thread is started.
    pub fn spawn(&self, request: BuildRequest) -> Result<BuildHandle, BuildError> {
        request.validate()?;
        let guard = RunGuard::acquire(&self.active)?;
        let (tx, rx) = channel();
        let runner = Arc::clone(&self.runner);

        let worker = std::thread::Builder::new()
            .name("cmpail-build".into())
            .spawn(move || {
                let _guard = guard;
                execute(request, runner, &EventSink(tx))
            })
            .map_err(|source| BuildError::Io {
                path: "build worker".into(),
                source,
            })?;

        Ok(BuildHandle { events: rx, worker })
    }

    /// Runs `request` on the calling thread, sending progress to `events`.
    pub fn run(
        &self,
        request: BuildRequest,
        events: Sender<BuildEvent>,
    ) -> Result<BuildOutcome, BuildError> {
        request.validate()?;
        let _guard = RunGuard::acquire(&self.active)?;
        execute(request, Arc::clone(&self.runner), &EventSink(events))
    }
}

/// Holds the "run in progress" flag for the lifetime of one run.
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, BuildError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BuildError::RunInProgress)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct EventSink(Sender<BuildEvent>);

impl EventSink {
    // An observer that stopped listening does not stop the build.
    fn emit(&self, event: BuildEvent) {
        let _ = self.0.send(event);
    }

    fn state(&self, state: RunState) {
        self.emit(BuildEvent::State(state));
    }

    fn info(&self, msg: impl Into<String>) {
        self.emit(BuildEvent::Info(msg.into()));
    }

    fn warn(&self, msg: impl Into<String>) {
        self.emit(BuildEvent::Warning(msg.into()));
    }
}

fn execute<R: CommandRunner>(
    request: BuildRequest,
    runner: R,
    sink: &EventSink,
) -> Result<BuildOutcome, BuildError> {
    sink.state(RunState::Loading);
    sink.info(format!("Starting compilation with {}...", request.compiler));
    sink.info(format!("Output directory: {}", request.output_dir.display()));

    let store = ManifestStore::new(request.manifest_path());
    let mut manifest = match store.try_load() {
        Ok(manifest) => manifest,
        Err(e) => {
            sink.warn(format!("{e}; starting with empty build history"));
            Manifest::default()
        }
    };

    let obj_dir = request.obj_dir();
    fs::create_dir_all(&obj_dir).map_err(|source| BuildError::Io {
        path: obj_dir.clone(),
        source,
    })?;
    sink.info(format!("Object files directory: {}", obj_dir.display()));

    if request.clean {
        sink.state(RunState::Cleaning);
        let (removed, failed) = clean_objects(&obj_dir);
        for (path, e) in failed {
            sink.warn(format!("could not remove {}: {}", path.display(), e));
        }
        manifest.clear();
        sink.info(format!("Clean build: removed {} object file(s)", removed.len()));
    }

    let plan = planner::plan(&request, &manifest);
    for source in &plan.duplicates {
        sink.warn(format!("{} is listed more than once; building it once", source.display()));
    }
    for (object, sources) in &plan.collisions {
        let names: Vec<String> = sources.iter().map(|s| s.display().to_string()).collect();
        sink.warn(format!(
            "{} is produced by several sources ({}); only the last compiled survives",
            object.display(),
            names.join(", ")
        ));
    }
    for planned in &plan.sources {
        sink.emit(BuildEvent::Decision {
            source: planned.source.clone(),
            staleness: planned.staleness.clone(),
        });
    }

    sink.state(RunState::Compiling);
    let toolchain = Toolchain::with_runner(
        &request.compiler,
        &request.compiler_flags,
        &request.package_flags,
        runner,
    );
    let skipped = plan.skip_count();
    let mut recompiled = 0;
    let mut failure: Option<ToolchainError> = None;

    for planned in plan.recompile() {
        let command = toolchain.compile_command(&planned.source, &planned.object);
        sink.emit(BuildEvent::CompileStarted {
            source: planned.source.clone(),
            command: command.to_string(),
        });

        // Hash what is about to be compiled, not what is on disk afterwards.
        let hash = ContentHash::of_file(&planned.source);
        match toolchain.compile(&planned.source, &planned.object) {
            Ok(output) => {
                match hash {
                    Ok(hash) => manifest.record(&planned.source, hash),
                    Err(e) => {
                        sink.warn(e.to_string());
                        manifest.forget(&planned.source);
                    }
                }
                recompiled += 1;
                sink.emit(BuildEvent::Compiled {
                    source: planned.source.clone(),
                    stderr: output.stderr,
                });
            }
            Err(e) => {
                sink.emit(BuildEvent::CompileFailed(e.clone()));
                failure = Some(e);
                break;
            }
        }
    }

    let mut linked = false;
    if failure.is_none() {
        if plan.link {
            sink.state(RunState::Linking);
            let objects = plan.objects();
            sink.emit(BuildEvent::LinkStarted {
                exe: plan.exe_path.clone(),
                command: toolchain.link_command(&objects, &plan.exe_path).to_string(),
            });
            match toolchain.link(&objects, &plan.exe_path) {
                Ok(output) => {
                    linked = true;
                    sink.emit(BuildEvent::Linked {
                        exe: plan.exe_path.clone(),
                        stderr: output.stderr,
                    });
                }
                Err(e) => {
                    sink.emit(BuildEvent::LinkFailed(e.clone()));
                    failure = Some(e);
                }
            }
        } else {
            sink.emit(BuildEvent::LinkSkipped);
        }
    }

    sink.state(RunState::Saving);
    if let Err(e) = store.save(&manifest) {
        sink.warn(format!("{e}; the next build will not reuse this one"));
    }

    sink.state(RunState::Done);
    let outcome = match failure {
        None => BuildOutcome::Success(BuildSummary {
            exe_path: plan.exe_path.clone(),
            recompiled,
            skipped,
            linked,
        }),
        Some(error) => BuildOutcome::Failure(BuildFailure {
            error,
            recompiled,
            skipped,
        }),
    };
    sink.emit(BuildEvent::Finished(outcome.clone()));
    Ok(outcome)
}
