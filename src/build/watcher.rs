use super::orchestrator::Orchestrator;
use super::request::BuildRequest;
use crate::ui;
use anyhow::Result;
use colored::*;
use notify::{Config, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Rebuilds whenever one of the request's sources changes.
///
/// One orchestrator serves every rebuild, so a change arriving mid-build
/// waits for the next cycle instead of starting a second run.
pub fn watch(mut request: BuildRequest, verbose: bool) -> Result<()> {
    let dirs: BTreeSet<PathBuf> = request
        .sources
        .iter()
        .map(|s| match s.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        })
        .collect();

    println!("{} Watching {} source director(ies)...", "👀".cyan(), dirs.len());

    let (tx, rx) = channel();
    let config_notify = Config::default().with_poll_interval(Duration::from_secs(1));
    let mut watcher = notify::RecommendedWatcher::new(tx, config_notify)?;
    for dir in &dirs {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }

    let orchestrator = Orchestrator::new();

    // First run
    rebuild(&orchestrator, &request, verbose);
    // A clean build only makes sense once.
    request.clean = false;

    while let Ok(event) = rx.recv() {
        let mut touches_source = touches(&event, &request.sources);
        // Debounce simple
        std::thread::sleep(Duration::from_millis(100));
        while let Ok(event) = rx.try_recv() {
            touches_source |= touches(&event, &request.sources);
        }
        if touches_source {
            rebuild(&orchestrator, &request, verbose);
        }
    }
    Ok(())
}

fn touches(event: &notify::Result<notify::Event>, sources: &[PathBuf]) -> bool {
    match event {
        Ok(ev) => ev.paths.iter().any(|p| sources.iter().any(|s| same_file(p, s))),
        Err(_) => false,
    }
}

fn same_file(event_path: &Path, source: &Path) -> bool {
    match (event_path.canonicalize(), source.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => event_path.ends_with(source),
    }
}

fn rebuild(orchestrator: &Orchestrator, request: &BuildRequest, verbose: bool) {
    print!("\x1B[2J\x1B[1;1H");
    println!("{} Rebuilding...", "🔄".yellow());

    match orchestrator.spawn(request.clone()) {
        Ok(handle) => {
            if let Err(e) = ui::report(handle, verbose) {
                println!("{} Error: {}", "x".red(), e);
            }
        }
        Err(e) => println!("{} Error: {}", "x".red(), e),
    }
}
