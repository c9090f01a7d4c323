use super::request::{BuildRequest, DEFAULT_COMPILER, DEFAULT_EXE_NAME, DEFAULT_FLAGS};
use crate::config::{CONFIG_FILE, CmpailConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SOURCE_EXTENSIONS: [&str; 4] = ["c", "cpp", "cc", "cxx"];

// --- Helper: Load Config ---
/// Reads `path`, or `cmpail.toml` in the current directory when `path` is
/// `None`. A missing default file yields the empty config; a missing explicit
/// file is an error.
pub fn load_config(path: Option<&Path>) -> Result<CmpailConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(CONFIG_FILE), false),
    };
    if !path.exists() {
        if explicit {
            return Err(anyhow::anyhow!("{} not found", path.display()));
        }
        return Ok(CmpailConfig::default());
    }
    let config_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&config_str).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors or misspelled keys",
            path.display()
        )
    })
}

// --- Helper: Collect Source Files ---
/// All C/C++ translation units under `dir`, sorted for a stable build order.
pub fn discover_sources(dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
        })
        .collect();
    sources.sort();
    sources
}

/// Build settings from the command line. `None` defers to the config file,
/// then to the built-in defaults.
#[derive(Debug, Default, Clone)]
pub struct BuildOptions {
    pub sources: Vec<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub compiler: Option<String>,
    pub flags: Option<String>,
    pub packages: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub exe_name: Option<String>,
    pub no_incremental: bool,
    pub clean: bool,
}

impl BuildOptions {
    /// Merges options over `config` into a request. Duplicate sources are
    /// dropped, first occurrence wins.
    pub fn into_request(self, config: &CmpailConfig) -> BuildRequest {
        let cfg = &config.build;

        let mut sources = if !self.sources.is_empty() {
            self.sources
        } else if let Some(listed) = &cfg.sources {
            listed.clone()
        } else {
            let dir = self
                .source_dir
                .or_else(|| cfg.source_dir.clone())
                .unwrap_or_else(|| PathBuf::from("src"));
            discover_sources(&dir)
        };
        let mut seen = std::collections::HashSet::new();
        sources.retain(|s| seen.insert(s.clone()));

        let output_dir = self
            .output_dir
            .or_else(|| cfg.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("build"));

        BuildRequest {
            sources,
            compiler: self
                .compiler
                .or_else(|| cfg.compiler.clone())
                .unwrap_or_else(|| DEFAULT_COMPILER.to_string()),
            compiler_flags: self
                .flags
                .or_else(|| cfg.flags.clone())
                .unwrap_or_else(|| DEFAULT_FLAGS.to_string()),
            package_flags: self.packages.or_else(|| cfg.packages.clone()).unwrap_or_default(),
            output_dir,
            exe_name: self
                .exe_name
                .or_else(|| cfg.exe_name.clone())
                .unwrap_or_else(|| DEFAULT_EXE_NAME.to_string()),
            incremental: !self.no_incremental && cfg.incremental.unwrap_or(true),
            clean: self.clean,
            manifest_path: cfg.manifest.clone(),
        }
    }
}
