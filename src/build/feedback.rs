use crate::toolchain::Stage;
use colored::*;

/// Turns common toolchain stderr patterns into a one-paragraph hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(stage: Stage, output: &str) -> Option<String> {
        // 1. Main function missing (Specific Linker Error)
        if output.contains("undefined reference to `main'")
            || output.contains("entry point must be defined")
            || output.contains("_main\", referenced from")
        {
            return Some(format!(
                "None of the selected sources defines {}.\nAdd the file containing it to the source list.",
                "main()".bold().yellow(),
            ));
        }

        // 2. Generic Missing Library (Linker Error)
        if output.contains("LNK2019") || output.contains("undefined reference to") {
            return Some(format!(
                "It looks like a {} error.\nA source file may be missing from the build, or a library from {}.\nLibraries go after the objects, e.g. {}.",
                "Linker".bold().red(),
                "--packages".bold().yellow(),
                "--packages \"-lm -lpthread\"".bold().green()
            ));
        }

        // 3. Missing Header (Compiler Error)
        if (output.contains("fatal error: ") && output.contains("No such file or directory"))
            || output.contains("cannot open include file")
        {
            return Some(format!(
                "It looks like a {} error.\nPass the include directory in {}, e.g. {}.",
                "Missing Header".bold().red(),
                "--flags".bold().yellow(),
                "--flags \"-O2 -Wall -Iinclude\"".bold().green()
            ));
        }

        // 4. Library not found by the linker
        if stage == Stage::Link && output.contains("cannot find -l") {
            return Some(format!(
                "The linker could not find a library named in {}.\nCheck the spelling or install its development package.",
                "--packages".bold().yellow()
            ));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linker_error() {
        let err = "error LNK2019: unresolved external symbol foo";
        let msg = FeedbackAnalyzer::analyze(Stage::Link, err).unwrap();
        assert!(msg.contains("Linker"));
        assert!(msg.contains("--packages"));
    }

    #[test]
    fn test_include_error() {
        let err = "fatal error: foo.h: No such file or directory";
        let msg = FeedbackAnalyzer::analyze(Stage::Compile, err).unwrap();
        assert!(msg.contains("Missing Header"));
    }

    #[test]
    fn test_main_error() {
        let err = "undefined reference to `main'";
        let msg = FeedbackAnalyzer::analyze(Stage::Link, err).unwrap();
        assert!(msg.contains("main()"));
    }

    #[test]
    fn test_missing_library() {
        let err = "/usr/bin/ld: cannot find -lSDL2";
        let msg = FeedbackAnalyzer::analyze(Stage::Link, err).unwrap();
        assert!(msg.contains("could not find a library"));
    }

    #[test]
    fn test_plain_syntax_error_has_no_hint() {
        assert!(FeedbackAnalyzer::analyze(Stage::Compile, "error: expected ';'").is_none());
    }
}
