//! # cmpail - Incremental C/C++ Build Orchestrator
//!
//! cmpail compiles a list of C/C++ sources into object files and links them
//! into one executable, recompiling only what changed since the last
//! successful build.
//!
//! ## Features
//!
//! - **Content Tracking**: 128-bit hashes recorded in `build_info.json`
//! - **Fail Fast**: The first compile error stops the build, nothing is linked
//! - **Minimal Relinking**: Links only when something was recompiled or the
//!   executable is missing
//! - **Background Builds**: One worker thread per build, progress as an event stream
//!
//! ## Quick Start
//!
//! ```bash
//! # Build two files into build/app
//! cmpail build src/main.c src/util.c --out-dir build --exe-name app
//!
//! # See what would be recompiled
//! cmpail plan src/main.c src/util.c --out-dir build
//! ```
//!
//! ## Module Organization
//!
//! - [`build`] - Planning and orchestration of a build run
//! - [`manifest`] - Persisted hash record
//! - [`toolchain`] - Compiler invocation
//! - [`config`] - Configuration parsing (`cmpail.toml`)

/// Build planning, orchestration, and the commands built on them.
pub mod build;

/// Configuration file parsing (`cmpail.toml`).
pub mod config;

/// Error types surfaced to callers.
pub mod error;

/// Content hashing of source files.
pub mod hash;

/// Build manifest (`build_info.json`) storage.
pub mod manifest;

/// Compile and link command execution.
pub mod toolchain;

/// Terminal UI utilities (event rendering, tables).
pub mod ui;

pub use build::{BuildOutcome, BuildRequest, Orchestrator};
pub use error::BuildError;
