use super::request::BuildRequest;
use super::staleness::{self, Staleness};
use crate::manifest::Manifest;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSource {
    pub source: PathBuf,
    pub object: PathBuf,
    pub staleness: Staleness,
}

/// What a run will do. Recomputed every run, never persisted.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// One entry per source, in the order the sources were supplied.
    pub sources: Vec<PlannedSource>,
    pub exe_path: PathBuf,
    pub link: bool,
    /// Object paths claimed by more than one source.
    pub collisions: Vec<(PathBuf, Vec<PathBuf>)>,
    /// Sources listed more than once; only the first occurrence is planned.
    pub duplicates: Vec<PathBuf>,
}

impl BuildPlan {
    pub fn recompile(&self) -> impl Iterator<Item = &PlannedSource> {
        self.sources.iter().filter(|s| s.staleness.needs_recompile())
    }

    pub fn recompile_count(&self) -> usize {
        self.recompile().count()
    }

    pub fn skip_count(&self) -> usize {
        self.sources.len() - self.recompile_count()
    }

    /// Object list handed to the linker.
    pub fn objects(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.object.clone()).collect()
    }
}

/// Builds the plan for `request` against `manifest` and the filesystem.
///
/// With `clean` or without `incremental` every source is forced and the
/// staleness check is not consulted. Clean-build side effects (deleting
/// objects, clearing the manifest) belong to the caller.
pub fn plan(request: &BuildRequest, manifest: &Manifest) -> BuildPlan {
    let force = request.clean || !request.incremental;

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let sources: Vec<PlannedSource> = request
        .sources
        .iter()
        .filter(|source| {
            if seen.insert(source.as_path()) {
                true
            } else {
                duplicates.push(source.to_path_buf());
                false
            }
        })
        .map(|source| {
            let object = request.object_path(source);
            let staleness = if force {
                Staleness::Forced
            } else {
                staleness::needs_recompile(source, &object, manifest)
            };
            PlannedSource {
                source: source.clone(),
                object,
                staleness,
            }
        })
        .collect();

    let exe_path = request.exe_path();
    let link = sources.iter().any(|s| s.staleness.needs_recompile()) || !exe_path.exists();

    BuildPlan {
        collisions: find_collisions(&sources),
        sources,
        exe_path,
        link,
        duplicates,
    }
}

fn find_collisions(sources: &[PlannedSource]) -> Vec<(PathBuf, Vec<PathBuf>)> {
    let mut by_object: BTreeMap<&PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for planned in sources {
        by_object
            .entry(&planned.object)
            .or_default()
            .push(planned.source.clone());
    }
    by_object
        .into_iter()
        .filter(|(_, claimants)| claimants.len() > 1)
        .map(|(object, claimants)| (object.clone(), claimants))
        .collect()
}
