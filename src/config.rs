//! Optional project file (`cmpail.toml`).
//!
//! ```toml
//! [build]
//! sources = ["src/main.c", "src/util.c"]
//! compiler = "gcc"
//! flags = "-O2 -Wall"
//! packages = "-lm"
//! output_dir = "build"
//! exe_name = "app"
//! ```
//!
//! Every field is optional; command-line options take precedence.

use serde::Deserialize;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "cmpail.toml";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CmpailConfig {
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    pub sources: Option<Vec<PathBuf>>,
    /// Directory scanned for sources when `sources` is not given.
    pub source_dir: Option<PathBuf>,
    pub compiler: Option<String>,
    pub flags: Option<String>,
    pub packages: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub exe_name: Option<String>,
    pub incremental: Option<bool>,
    /// Manifest location, defaults to `<output_dir>/build_info.json`.
    pub manifest: Option<PathBuf>,
}
