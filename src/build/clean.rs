//! Build artifact cleanup.
//!
//! Used in two places: the Cleaning state of a run (object files only) and
//! the `cmpail clean` command (object files plus the manifest).

use crate::manifest::ManifestStore;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Deletes every `*.o` file directly inside `obj_dir`.
///
/// Returns the removed paths and the per-file errors; one file that cannot
/// be removed does not stop the rest. A missing directory is nothing to do.
pub fn clean_objects(obj_dir: &Path) -> (Vec<PathBuf>, Vec<(PathBuf, std::io::Error)>) {
    let mut removed = Vec::new();
    let mut failed = Vec::new();

    let Ok(entries) = fs::read_dir(obj_dir) else {
        return (removed, failed);
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_object = path.extension().is_some_and(|ext| ext == "o");
        if is_object && path.is_file() {
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) => failed.push((path, e)),
            }
        }
    }

    (removed, failed)
}

/// `cmpail clean`: remove objects and the manifest, optionally the whole
/// output directory.
pub fn clean(output_dir: &Path, manifest: &ManifestStore, all: bool) -> Result<()> {
    if all {
        if output_dir.exists() {
            fs::remove_dir_all(output_dir)
                .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
            println!("{} Removed {}", "🗑️".red(), output_dir.display());
        } else {
            println!("{} Nothing to clean", "!".yellow());
        }
        // A manifest kept outside the output directory survives remove_dir_all.
        manifest.remove()?;
        return Ok(());
    }

    let (removed, failed) = clean_objects(&output_dir.join("obj"));
    for (path, e) in &failed {
        println!("{} Could not remove {}: {}", "!".yellow(), path.display(), e);
    }
    let had_manifest = manifest.remove()?;

    if removed.is_empty() && !had_manifest {
        println!("{} Nothing to clean", "!".yellow());
    } else {
        println!(
            "{} Removed {} object file(s){}",
            "✓".green(),
            removed.len(),
            if had_manifest { " and the build manifest" } else { "" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{MANIFEST_FILE, Manifest};

    #[test]
    fn test_clean_objects_only_touches_object_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.o"), "").unwrap();
        fs::write(dir.path().join("b.o"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let (removed, failed) = clean_objects(dir.path());
        assert_eq!(removed.len(), 2);
        assert!(failed.is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_clean_objects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (removed, failed) = clean_objects(&dir.path().join("obj"));
        assert!(removed.is_empty() && failed.is_empty());
    }

    #[test]
    fn test_clean_removes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("obj")).unwrap();
        fs::write(out.join("obj").join("main.o"), "").unwrap();
        let store = ManifestStore::new(out.join(MANIFEST_FILE));
        store.save(&Manifest::default()).unwrap();

        clean(&out, &store, false).unwrap();
        assert!(!out.join("obj").join("main.o").exists());
        assert!(!store.path().exists());
        assert!(out.exists());
    }

    #[test]
    fn test_clean_all_removes_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("obj")).unwrap();
        let store = ManifestStore::new(out.join(MANIFEST_FILE));

        clean(&out, &store, true).unwrap();
        assert!(!out.exists());
    }
}
