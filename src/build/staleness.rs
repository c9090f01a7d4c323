use crate::hash::ContentHash;
use crate::manifest::Manifest;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Why a source was (or was not) scheduled for recompilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// Clean or non-incremental build.
    Forced,
    ObjectMissing,
    NotRecorded,
    ContentChanged,
    SourceNewer,
    /// Hash or timestamps could not be read; recompiled rather than trusted.
    Unreadable(String),
    /// Source vanished. Nothing to compile, any old object is kept.
    SourceMissing,
    UpToDate,
}

impl Staleness {
    pub fn needs_recompile(&self) -> bool {
        !matches!(self, Staleness::SourceMissing | Staleness::UpToDate)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::Forced => write!(f, "forced rebuild"),
            Staleness::ObjectMissing => write!(f, "no object file"),
            Staleness::NotRecorded => write!(f, "not in manifest"),
            Staleness::ContentChanged => write!(f, "content changed"),
            Staleness::SourceNewer => write!(f, "source newer than object"),
            Staleness::Unreadable(reason) => write!(f, "unreadable ({reason})"),
            Staleness::SourceMissing => write!(f, "source missing"),
            Staleness::UpToDate => write!(f, "unchanged"),
        }
    }
}

/// Decides whether `object` still reflects `source`.
///
/// Order of checks: object presence, source presence, content hash against
/// the manifest, then modification times. An object whose mtime equals the
/// source's counts as current.
pub fn needs_recompile(source: &Path, object: &Path, manifest: &Manifest) -> Staleness {
    if !object.exists() {
        return Staleness::ObjectMissing;
    }
    if !source.exists() {
        return Staleness::SourceMissing;
    }

    let current = match ContentHash::of_file(source) {
        Ok(hash) => hash,
        Err(e) => return Staleness::Unreadable(e.source.to_string()),
    };
    match manifest.hash_of(source) {
        None => return Staleness::NotRecorded,
        Some(recorded) if recorded != current => return Staleness::ContentChanged,
        Some(_) => {}
    }

    match (modified(source), modified(object)) {
        (Ok(src_time), Ok(obj_time)) if obj_time < src_time => Staleness::SourceNewer,
        (Ok(_), Ok(_)) => Staleness::UpToDate,
        (Err(e), _) | (_, Err(e)) => Staleness::Unreadable(e.to_string()),
    }
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn setup() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.c");
        let object = dir.path().join("a.o");
        fs::write(&source, "int a;").unwrap();
        fs::write(&object, "obj").unwrap();
        (dir, source, object)
    }

    fn recorded(source: &Path) -> Manifest {
        let mut manifest = Manifest::default();
        manifest.record(source, ContentHash::of_file(source).unwrap());
        manifest
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_object_missing() {
        let (_dir, source, object) = setup();
        fs::remove_file(&object).unwrap();
        assert_eq!(
            needs_recompile(&source, &object, &Manifest::default()),
            Staleness::ObjectMissing
        );
    }

    #[test]
    fn test_source_missing_keeps_object() {
        let (_dir, source, object) = setup();
        fs::remove_file(&source).unwrap();
        let decision = needs_recompile(&source, &object, &Manifest::default());
        assert_eq!(decision, Staleness::SourceMissing);
        assert!(!decision.needs_recompile());
        assert!(object.exists());
    }

    #[test]
    fn test_no_recorded_hash() {
        let (_dir, source, object) = setup();
        assert_eq!(
            needs_recompile(&source, &object, &Manifest::default()),
            Staleness::NotRecorded
        );
    }

    #[test]
    fn test_content_changed() {
        let (_dir, source, object) = setup();
        let manifest = recorded(&source);
        fs::write(&source, "int b;").unwrap();
        assert_eq!(
            needs_recompile(&source, &object, &manifest),
            Staleness::ContentChanged
        );
    }

    #[test]
    fn test_source_newer_than_object() {
        let (_dir, source, object) = setup();
        let manifest = recorded(&source);
        let now = SystemTime::now();
        set_mtime(&object, now - Duration::from_secs(60));
        set_mtime(&source, now);
        assert_eq!(
            needs_recompile(&source, &object, &manifest),
            Staleness::SourceNewer
        );
    }

    #[test]
    fn test_up_to_date_when_times_equal() {
        let (_dir, source, object) = setup();
        let manifest = recorded(&source);
        let now = SystemTime::now();
        set_mtime(&object, now);
        set_mtime(&source, now);
        let decision = needs_recompile(&source, &object, &manifest);
        assert_eq!(decision, Staleness::UpToDate);
        assert!(!decision.needs_recompile());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_source_forces_recompile() {
        // A directory in place of the source makes the read fail.
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("dir.c");
        let object = dir.path().join("dir.o");
        fs::create_dir(&source).unwrap();
        fs::write(&object, "obj").unwrap();
        let decision = needs_recompile(&source, &object, &Manifest::default());
        assert!(matches!(decision, Staleness::Unreadable(_)));
        assert!(decision.needs_recompile());
    }
}
