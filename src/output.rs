//! CLI output formatting for task runs.
//!
//! # Output Format
//!
//! ## Progress (a header per task, one line as each file finishes)
//!
//! File lines carry their task, since `default` runs tasks concurrently and
//! their lines interleave.
//!
//! ```text
//! images (3 files)
//!     [images] img/hero.jpg: written 2.4 MB → 310.2 KB
//!     [images] img/logo.png: written 12.0 KB → 9.1 KB
//!     [images] img/team.jpg: cached
//! ```
//!
//! Renamed outputs show both names:
//!
//! ```text
//!     [images] photo.jpg → photo.1920w-1080h.jpg: written 1.1 MB → 201.5 KB
//! ```
//!
//! ## Summary (after each task)
//!
//! ```text
//! images: 2 written, 0 unchanged, 1 cached, saved 2.1 MB (2.4 MB → 319.3 KB)
//! ```
//!
//! A `, N skipped` count is added when renamed outputs were skipped.
//!
//! ## Check
//!
//! ```text
//! js (1 file)
//!     js/app.js
//! css (0 files)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::scan::SelectedFile;
use crate::tasks::{FileOutcome, FileStatus, Task, TaskEvent, TaskReport};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_count(n: usize) -> String {
    match n {
        1 => "1 file".to_string(),
        n => format!("{n} files"),
    }
}

/// Human-readable byte size: `512 B`, `1.5 KB`, `2.4 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn outcome_line(task: Task, outcome: &FileOutcome) -> String {
    let name = if outcome.output == outcome.source {
        outcome.source.clone()
    } else {
        format!("{} \u{2192} {}", outcome.source, outcome.output)
    };
    let status = match outcome.status {
        FileStatus::Written => format!(
            "written {} \u{2192} {}",
            format_bytes(outcome.bytes_before),
            format_bytes(outcome.bytes_after)
        ),
        FileStatus::Unchanged => "unchanged".to_string(),
        FileStatus::Cached => "cached".to_string(),
        FileStatus::Skipped => "skipped, output is another selected file".to_string(),
    };
    format!("{}[{}] {}: {}", indent(1), task, name, status)
}

// ============================================================================
// Progress
// ============================================================================

pub fn format_task_event(event: &TaskEvent) -> Vec<String> {
    match event {
        TaskEvent::TaskStarted { task, file_count: n } => {
            vec![format!("{} ({})", task, file_count(*n))]
        }
        TaskEvent::FileDone { task, outcome } => vec![outcome_line(*task, outcome)],
    }
}

// ============================================================================
// Summary
// ============================================================================

/// One summary line per task report.
pub fn format_task_report(report: &TaskReport) -> Vec<String> {
    let written = report.count(FileStatus::Written);
    let mut line = format!(
        "{}: {} written, {} unchanged, {} cached",
        report.task,
        written,
        report.count(FileStatus::Unchanged),
        report.count(FileStatus::Cached),
    );
    let skipped = report.count(FileStatus::Skipped);
    if skipped > 0 {
        line.push_str(&format!(", {skipped} skipped"));
    }
    if written > 0 {
        let (before, after) = report.written_bytes();
        line.push_str(&format!(
            ", saved {} ({} \u{2192} {})",
            format_bytes(before.saturating_sub(after)),
            format_bytes(before),
            format_bytes(after)
        ));
    }
    vec![line]
}

pub fn print_task_report(report: &TaskReport) {
    for line in format_task_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// List the files each task would select.
pub fn format_check_output(selection: &[(Task, Vec<SelectedFile>)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (task, files) in selection {
        lines.push(format!("{} ({})", task, file_count(files.len())));
        for file in files {
            lines.push(format!("{}{}", indent(1), file.relative));
        }
    }
    lines
}

pub fn print_check_output(selection: &[(Task, Vec<SelectedFile>)]) {
    for line in format_check_output(selection) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcome(source: &str, output: &str, before: u64, after: u64, status: FileStatus) -> FileOutcome {
        FileOutcome {
            source: source.to_string(),
            output: output.to_string(),
            bytes_before: before,
            bytes_after: after,
            status,
        }
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn format_task_started() {
        let lines = format_task_event(&TaskEvent::TaskStarted {
            task: Task::Images,
            file_count: 3,
        });
        assert_eq!(lines, vec!["images (3 files)"]);

        let lines = format_task_event(&TaskEvent::TaskStarted {
            task: Task::Js,
            file_count: 1,
        });
        assert_eq!(lines, vec!["js (1 file)"]);
    }

    #[test]
    fn format_file_written() {
        let event = TaskEvent::FileDone {
            task: Task::Css,
            outcome: outcome("css/site.css", "css/site.css", 2048, 512, FileStatus::Written),
        };
        assert_eq!(
            format_task_event(&event),
            vec!["    [css] css/site.css: written 2.0 KB \u{2192} 512 B"]
        );
    }

    #[test]
    fn format_file_renamed() {
        let event = TaskEvent::FileDone {
            task: Task::Images,
            outcome: outcome(
                "photo.jpg",
                "photo.1920w-1080h.jpg",
                4096,
                1024,
                FileStatus::Written,
            ),
        };
        let lines = format_task_event(&event);
        assert!(lines[0].starts_with("    [images] photo.jpg \u{2192} photo.1920w-1080h.jpg: written"));
    }

    #[test]
    fn format_file_cached_and_unchanged() {
        let cached = TaskEvent::FileDone {
            task: Task::Js,
            outcome: outcome("a.js", "a.js", 10, 10, FileStatus::Cached),
        };
        let unchanged = TaskEvent::FileDone {
            task: Task::Js,
            outcome: outcome("b.js", "b.js", 10, 10, FileStatus::Unchanged),
        };
        assert_eq!(format_task_event(&cached), vec!["    [js] a.js: cached"]);
        assert_eq!(format_task_event(&unchanged), vec!["    [js] b.js: unchanged"]);
    }

    #[test]
    fn format_file_lines_name_their_task() {
        let js = TaskEvent::FileDone {
            task: Task::Js,
            outcome: outcome("app.js", "app.js", 10, 10, FileStatus::Cached),
        };
        let css = TaskEvent::FileDone {
            task: Task::Css,
            outcome: outcome("site.css", "site.css", 10, 10, FileStatus::Cached),
        };
        assert_eq!(format_task_event(&js), vec!["    [js] app.js: cached"]);
        assert_eq!(format_task_event(&css), vec!["    [css] site.css: cached"]);
    }

    #[test]
    fn format_skipped_file_and_summary() {
        let skipped = outcome("a.png", "a.jpg", 10, 10, FileStatus::Skipped);
        let event = TaskEvent::FileDone {
            task: Task::Images,
            outcome: skipped.clone(),
        };
        assert_eq!(
            format_task_event(&event),
            vec!["    [images] a.png \u{2192} a.jpg: skipped, output is another selected file"]
        );

        let report = TaskReport {
            task: Task::Images,
            files: vec![skipped],
        };
        assert_eq!(
            format_task_report(&report),
            vec!["images: 0 written, 0 unchanged, 0 cached, 1 skipped"]
        );
    }

    #[test]
    fn format_report_with_savings() {
        let report = TaskReport {
            task: Task::Images,
            files: vec![
                outcome("a.jpg", "a.jpg", 3072, 1024, FileStatus::Written),
                outcome("b.png", "b.png", 500, 500, FileStatus::Unchanged),
                outcome("c.jpg", "c.jpg", 700, 700, FileStatus::Cached),
            ],
        };
        assert_eq!(
            format_task_report(&report),
            vec!["images: 1 written, 1 unchanged, 1 cached, saved 2.0 KB (3.0 KB \u{2192} 1.0 KB)"]
        );
    }

    #[test]
    fn format_report_all_cached_has_no_savings() {
        let report = TaskReport {
            task: Task::Html,
            files: vec![outcome("index.html", "index.html", 10, 10, FileStatus::Cached)],
        };
        assert_eq!(
            format_task_report(&report),
            vec!["html: 0 written, 0 unchanged, 1 cached"]
        );
    }

    #[test]
    fn format_check_lists_files_per_task() {
        let selection = vec![
            (
                Task::Js,
                vec![SelectedFile {
                    path: PathBuf::from("/site/public/js/app.js"),
                    relative: "js/app.js".to_string(),
                }],
            ),
            (Task::Css, vec![]),
        ];
        assert_eq!(
            format_check_output(&selection),
            vec!["js (1 file)", "    js/app.js", "css (0 files)"]
        );
    }
}
