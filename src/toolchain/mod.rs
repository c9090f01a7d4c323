//! Toolchain invocation
//!
//! Builds compile and link command lines for a GCC-style driver and runs them
//! as child processes. Flags are passed through literally; no attempt is made
//! to translate them between compilers.

pub mod types;

pub use types::{CommandOutput, Stage, ToolchainCommand, ToolchainError};

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Splits a flag string on whitespace.
///
/// There are no quoting rules: a flag whose value contains a space (for
/// example `-DNAME="a b"`) cannot be expressed and will be split in two.
pub fn tokenize(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}

/// Executes a [`ToolchainCommand`] to completion.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &ToolchainCommand) -> std::io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<R> {
    fn run(&self, command: &ToolchainCommand) -> std::io::Result<CommandOutput> {
        (**self).run(command)
    }
}

/// Runs commands as real child processes, capturing stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ToolchainCommand) -> std::io::Result<CommandOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        hide_console(&mut cmd);

        let output = cmd.output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(windows)]
fn hide_console(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console(_cmd: &mut Command) {}

/// A compiler driver plus the flags shared by every invocation of a run.
pub struct Toolchain<R = ProcessRunner> {
    compiler: String,
    compiler_flags: Vec<String>,
    package_flags: Vec<String>,
    runner: R,
}

impl Toolchain<ProcessRunner> {
    pub fn new(compiler: &str, compiler_flags: &str, package_flags: &str) -> Self {
        Self::with_runner(compiler, compiler_flags, package_flags, ProcessRunner)
    }
}

impl<R: CommandRunner> Toolchain<R> {
    pub fn with_runner(compiler: &str, compiler_flags: &str, package_flags: &str, runner: R) -> Self {
        Self {
            compiler: compiler.to_string(),
            compiler_flags: tokenize(compiler_flags),
            package_flags: tokenize(package_flags),
            runner,
        }
    }

    /// `<compiler> -c <source> -o <object> <flags...>`
    pub fn compile_command(&self, source: &Path, object: &Path) -> ToolchainCommand {
        ToolchainCommand::new(&self.compiler)
            .arg("-c")
            .arg(source.to_string_lossy())
            .arg("-o")
            .arg(object.to_string_lossy())
            .args(self.compiler_flags.iter().cloned())
    }

    /// `<compiler> <objects...> -o <exe> <flags...> <packages...>`
    pub fn link_command(&self, objects: &[PathBuf], exe: &Path) -> ToolchainCommand {
        ToolchainCommand::new(&self.compiler)
            .args(objects.iter().map(|o| o.to_string_lossy().into_owned()))
            .arg("-o")
            .arg(exe.to_string_lossy())
            .args(self.compiler_flags.iter().cloned())
            .args(self.package_flags.iter().cloned())
    }

    /// Compiles one translation unit. Blocks until the compiler exits.
    pub fn compile(&self, source: &Path, object: &Path) -> Result<CommandOutput, ToolchainError> {
        let command = self.compile_command(source, object);
        self.execute(&command, Stage::Compile, Some(source))
    }

    /// Links `objects` into `exe`. Blocks until the linker exits.
    pub fn link(&self, objects: &[PathBuf], exe: &Path) -> Result<CommandOutput, ToolchainError> {
        let command = self.link_command(objects, exe);
        self.execute(&command, Stage::Link, None)
    }

    fn execute(
        &self,
        command: &ToolchainCommand,
        stage: Stage,
        path: Option<&Path>,
    ) -> Result<CommandOutput, ToolchainError> {
        let output = self.runner.run(command).map_err(|e| ToolchainError {
            stage,
            path: path.map(Path::to_path_buf),
            stderr: format!("failed to execute `{}`: {}", command.program, e),
        })?;

        if output.success {
            Ok(output)
        } else {
            Err(ToolchainError {
                stage,
                path: path.map(Path::to_path_buf),
                stderr: output.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        calls: Mutex<Vec<ToolchainCommand>>,
        succeed: bool,
    }

    impl CommandRunner for Recording {
        fn run(&self, command: &ToolchainCommand) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(command.clone());
            Ok(CommandOutput {
                success: self.succeed,
                stdout: String::new(),
                stderr: if self.succeed { String::new() } else { "boom".into() },
            })
        }
    }

    struct Missing;

    impl CommandRunner for Missing {
        fn run(&self, _: &ToolchainCommand) -> std::io::Result<CommandOutput> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
        }
    }

    #[test]
    fn test_tokenize_whitespace_only() {
        assert_eq!(tokenize("  -O2\t-Wall \n"), vec!["-O2", "-Wall"]);
        assert!(tokenize("").is_empty());
        assert_eq!(tokenize("-DNAME=\"a b\""), vec!["-DNAME=\"a", "b\""]);
    }

    #[test]
    fn test_compile_command_shape() {
        let tc = Toolchain::new("gcc", "-O2 -Wall", "-lm");
        let cmd = tc.compile_command(Path::new("src/a.c"), Path::new("out/obj/a.o"));
        assert_eq!(cmd.program, "gcc");
        assert_eq!(cmd.args, vec!["-c", "src/a.c", "-o", "out/obj/a.o", "-O2", "-Wall"]);
    }

    #[test]
    fn test_link_command_shape() {
        let tc = Toolchain::new("g++", "-O2", "-lm -lpthread");
        let objects = vec![PathBuf::from("obj/a.o"), PathBuf::from("obj/b.o")];
        let cmd = tc.link_command(&objects, Path::new("out/app"));
        assert_eq!(
            cmd.args,
            vec!["obj/a.o", "obj/b.o", "-o", "out/app", "-O2", "-lm", "-lpthread"]
        );
        assert_eq!(cmd.to_string(), "g++ obj/a.o obj/b.o -o out/app -O2 -lm -lpthread");
    }

    #[test]
    fn test_nonzero_exit_carries_stderr_and_path() {
        let runner = Recording {
            calls: Mutex::new(Vec::new()),
            succeed: false,
        };
        let tc = Toolchain::with_runner("cc", "", "", runner);
        let err = tc.compile(Path::new("bad.c"), Path::new("bad.o")).unwrap_err();
        assert_eq!(err.stage, Stage::Compile);
        assert_eq!(err.path.as_deref(), Some(Path::new("bad.c")));
        assert_eq!(err.stderr, "boom");
        assert_eq!(err.to_string(), "compile failed for bad.c");
    }

    #[test]
    fn test_link_failure_has_no_path() {
        let runner = Recording {
            calls: Mutex::new(Vec::new()),
            succeed: false,
        };
        let tc = Toolchain::with_runner("cc", "", "", runner);
        let err = tc.link(&[], Path::new("app")).unwrap_err();
        assert_eq!(err.stage, Stage::Link);
        assert!(err.path.is_none());
        assert_eq!(err.to_string(), "link failed");
    }

    #[test]
    fn test_spawn_failure_is_toolchain_error() {
        let tc = Toolchain::with_runner("nope-cc", "", "", Missing);
        let err = tc.compile(Path::new("a.c"), Path::new("a.o")).unwrap_err();
        assert!(err.stderr.contains("failed to execute `nope-cc`"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_captures_output() {
        let cmd = ToolchainCommand::new("sh").arg("-c").arg("echo out; echo err >&2; exit 3");
        let output = ProcessRunner.run(&cmd).unwrap();
        assert!(!output.success);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }
}
