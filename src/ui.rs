//! Terminal rendering.
//!
//! - [`report`] drains a running build's event stream behind a spinner.
//! - [`print_plan`] shows the staleness decisions of a dry run.
//! - [`Table`] is the box-drawn table behind the dry-run view.

use crate::build::{BuildEvent, BuildHandle, BuildOutcome, BuildPlan, FeedbackAnalyzer, RunState};
use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::cmp;
use std::path::Path;
use std::time::Duration;

/// Prints a build's events as they arrive and returns its outcome.
pub fn report(handle: BuildHandle, verbose: bool) -> Result<BuildOutcome> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    for event in handle.events() {
        match event {
            BuildEvent::State(state) => pb.set_message(state_label(state)),
            BuildEvent::Info(msg) => {
                if verbose {
                    pb.println(format!("   {}", msg.dimmed()));
                }
            }
            BuildEvent::Warning(msg) => pb.println(format!("{} {}", "!".yellow(), msg)),
            BuildEvent::Decision { source, staleness } => {
                if !staleness.needs_recompile() {
                    pb.println(format!(
                        "{} Skipped ({}): {}",
                        "✓".green(),
                        staleness,
                        file_name(&source)
                    ));
                } else if verbose {
                    pb.println(format!("   {} {}: {}", "•".cyan(), staleness, source.display()));
                }
            }
            BuildEvent::CompileStarted { source, command } => {
                pb.set_message(format!("Compiling {}", file_name(&source)));
                if verbose {
                    pb.println(format!("   {}", command.dimmed()));
                }
            }
            BuildEvent::Compiled { source, stderr } => {
                pb.println(format!("{} Compiled {}", "✓".green(), file_name(&source)));
                if !stderr.trim().is_empty() {
                    pb.println(format!(
                        "{} Warning in {}:\n{}",
                        "!".yellow(),
                        source.display(),
                        stderr.trim_end()
                    ));
                }
            }
            BuildEvent::CompileFailed(e) => {
                let path = e.path.as_ref().map(|p| p.display().to_string());
                pb.println(format!(
                    "{} Error compiling {}:\n{}",
                    "x".red(),
                    path.unwrap_or_default(),
                    e.stderr.trim_end()
                ));
            }
            BuildEvent::LinkStarted { command, .. } => {
                pb.println(format!("   {} Linking...", "🔗".cyan()));
                if verbose {
                    pb.println(format!("   {}", command.dimmed()));
                }
            }
            BuildEvent::Linked { exe, stderr } => {
                if !stderr.trim().is_empty() {
                    pb.println(format!("{} Linker output:\n{}", "!".yellow(), stderr.trim_end()));
                }
                pb.println(format!("{} Created {}", "✓".green(), exe.display()));
            }
            BuildEvent::LinkFailed(e) => {
                pb.println(format!("{}", e.stderr.trim_end()));
                pb.println(format!("{} Linking failed", "x".red()));
            }
            BuildEvent::LinkSkipped => {
                pb.println(format!("{} No linking needed - no changes detected", "⚡".green()));
            }
            BuildEvent::Finished(_) => {}
        }
    }
    pb.finish_and_clear();

    let outcome = handle.join()?;
    print_outcome(&outcome);
    Ok(outcome)
}

fn print_outcome(outcome: &BuildOutcome) {
    println!("{}", "-".repeat(50).dimmed());
    match outcome {
        BuildOutcome::Success(summary) => {
            println!(
                "Summary: {} recompiled, {} skipped",
                summary.recompiled, summary.skipped
            );
            if summary.linked {
                println!("{} Build finished: {}", "✓".green(), summary.exe_path.display());
            } else {
                println!("{} Up to date", "⚡".green());
            }
        }
        BuildOutcome::Failure(failure) => {
            println!(
                "Summary: {} recompiled, {} skipped",
                failure.recompiled, failure.skipped
            );
            println!("{} {}", "x".red(), failure.error);
            if let Some(hint) = FeedbackAnalyzer::analyze(failure.stage(), failure.stderr()) {
                println!("\n{} {}", "💡".yellow(), hint);
            }
        }
    }
}

fn state_label(state: RunState) -> String {
    match state {
        RunState::Loading => "Loading build history...",
        RunState::Cleaning => "Cleaning objects...",
        RunState::Compiling => "Compiling...",
        RunState::Linking => "Linking...",
        RunState::Saving => "Saving build history...",
        RunState::Done => "Done",
    }
    .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Dry-run view: one row per source, then the link decision.
pub fn print_plan(plan: &BuildPlan) {
    let mut table = Table::new(&["Source", "Object", "Decision"]);
    for planned in &plan.sources {
        let decision = if planned.staleness.needs_recompile() {
            format!("{} ({})", "compile".yellow(), planned.staleness)
        } else {
            format!("{} ({})", "skip".green(), planned.staleness)
        };
        table.add_row(vec![
            planned.source.display().to_string(),
            planned.object.display().to_string(),
            decision,
        ]);
    }
    table.print();

    for source in &plan.duplicates {
        println!("{} {} is listed more than once", "!".yellow(), source.display());
    }
    for (object, sources) in &plan.collisions {
        println!(
            "{} {} is produced by {} sources",
            "!".yellow(),
            object.display(),
            sources.len()
        );
    }
    println!(
        "{} {} to compile, {} to skip, link: {}",
        "ℹ".blue(),
        plan.recompile_count(),
        plan.skip_count(),
        if plan.link { "yes".yellow() } else { "no".green() }
    );
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    /// Column widths after shrinking the widest columns (never below 8) until
    /// the table fits `max_width`.
    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], console::measure_text_width(cell));
            }
        }

        let overhead = 3 + 3 * self.headers.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        let widths = self.column_widths(max_width);
        let rule = |left: &str, mid: &str, right: &str| -> String {
            let parts: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, parts.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| -> String {
            let mut s = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let flat = cell.replace(['\n', '\r', '\t'], " ");
                let text = console::truncate_str(&flat, width, "...");
                let pad = width.saturating_sub(console::measure_text_width(&text));
                let text = if bold { text.bold().to_string() } else { text.to_string() };
                s.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
            }
            s
        };

        let mut out = vec![rule("┌", "┬", "┐"), line(self.headers.as_slice(), true), rule("├", "┼", "┤")];
        out.extend(self.rows.iter().map(|row| line(row.as_slice(), false)));
        out.push(rule("└", "┴", "┘"));
        out
    }

    pub fn print(&self) {
        if self.headers.is_empty() {
            return;
        }
        let (_rows, cols) = console::Term::stdout().size();
        for line in self.render(cols as usize) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_with_wrong_arity_are_ignored() {
        let mut table = Table::new(&["A", "B"]);
        table.add_row(vec!["1".into()]);
        table.add_row(vec!["1".into(), "2".into()]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_render_fits_width() {
        let mut table = Table::new(&["Source", "Decision"]);
        table.add_row(vec!["a".repeat(200), "compile".into()]);
        for line in table.render(60) {
            assert!(console::measure_text_width(&line) <= 60, "{line}");
        }
    }

    #[test]
    fn test_render_shape() {
        let mut table = Table::new(&["K", "V"]);
        table.add_row(vec!["key".into(), "value".into()]);
        let lines = table.render(80);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].trim_start().starts_with('┌'));
        assert!(lines[3].contains("value"));
    }
}
