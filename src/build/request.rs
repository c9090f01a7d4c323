use crate::error::BuildError;
use crate::manifest::MANIFEST_FILE;
use std::path::{Path, PathBuf};

pub const DEFAULT_COMPILER: &str = "gcc";
pub const DEFAULT_FLAGS: &str = "-O2 -Wall";
pub const DEFAULT_EXE_NAME: &str = "output";

/// Everything one build run needs. Constructed once, then moved into the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub sources: Vec<PathBuf>,
    pub compiler: String,
    /// Whitespace-separated flags passed to every compile and link.
    pub compiler_flags: String,
    /// Whitespace-separated library tokens appended to the link only.
    pub package_flags: String,
    pub output_dir: PathBuf,
    pub exe_name: String,
    pub incremental: bool,
    pub clean: bool,
    /// Overrides `<output_dir>/build_info.json`.
    pub manifest_path: Option<PathBuf>,
}

impl BuildRequest {
    pub fn new(sources: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources,
            compiler: DEFAULT_COMPILER.to_string(),
            compiler_flags: DEFAULT_FLAGS.to_string(),
            package_flags: String::new(),
            output_dir: output_dir.into(),
            exe_name: DEFAULT_EXE_NAME.to_string(),
            incremental: true,
            clean: false,
            manifest_path: None,
        }
    }

    /// Rejects requests that must never reach the toolchain.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.sources.is_empty() {
            return Err(BuildError::NoSources);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(BuildError::NoOutputDir);
        }
        Ok(())
    }

    pub fn obj_dir(&self) -> PathBuf {
        self.output_dir.join("obj")
    }

    /// `<output_dir>/obj/<stem>.o`. Sources sharing a stem map to the same
    /// object.
    pub fn object_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_EXE_NAME.to_string());
        self.obj_dir().join(format!("{stem}.o"))
    }

    pub fn exe_path(&self) -> PathBuf {
        let name = if self.exe_name.trim().is_empty() {
            DEFAULT_EXE_NAME
        } else {
            self.exe_name.trim()
        };
        self.output_dir.join(executable_name(name))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(MANIFEST_FILE))
    }
}

/// Appends `.exe` on Windows unless already present.
pub fn executable_name(name: &str) -> String {
    if cfg!(target_os = "windows") && !name.to_ascii_lowercase().ends_with(".exe") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = BuildRequest::new(vec![PathBuf::from("a.c")], "out");
        assert_eq!(req.compiler, "gcc");
        assert_eq!(req.compiler_flags, "-O2 -Wall");
        assert!(req.incremental);
        assert!(!req.clean);
        assert_eq!(req.manifest_path(), Path::new("out").join("build_info.json"));
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            BuildRequest::new(vec![], "out").validate(),
            Err(BuildError::NoSources)
        ));
        assert!(matches!(
            BuildRequest::new(vec![PathBuf::from("a.c")], "").validate(),
            Err(BuildError::NoOutputDir)
        ));
        assert!(BuildRequest::new(vec![PathBuf::from("a.c")], "out").validate().is_ok());
    }

    #[test]
    fn test_object_path_uses_stem() {
        let req = BuildRequest::new(vec![], "out");
        assert_eq!(
            req.object_path(Path::new("src/net/socket.cpp")),
            Path::new("out").join("obj").join("socket.o")
        );
    }

    #[test]
    fn test_exe_path_falls_back_to_default_name() {
        let mut req = BuildRequest::new(vec![], "out");
        req.exe_name = "  ".into();
        assert_eq!(req.exe_path(), Path::new("out").join(executable_name("output")));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_no_exe_suffix_off_windows() {
        assert_eq!(executable_name("app"), "app");
    }

    #[cfg(windows)]
    #[test]
    fn test_exe_suffix_on_windows() {
        assert_eq!(executable_name("app"), "app.exe");
        assert_eq!(executable_name("app.EXE"), "app.EXE");
    }
}
