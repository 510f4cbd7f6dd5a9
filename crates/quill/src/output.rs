//! Terminal reporting for build and check runs.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};
use quill_site::BuildSummary;

/// Width of the label column in the run header.
const LABEL_WIDTH: usize = 9;

/// Writes the run header, the final summary and errors to stderr.
pub(crate) struct Output {
    term: Term,
    label: Style,
    done: Style,
    failed: Style,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            label: Style::new().bold(),
            done: Style::new().green(),
            failed: Style::new().red(),
        }
    }

    /// One aligned `Label:  value` line of the run header.
    pub(crate) fn field(&self, label: &str, value: impl Display) {
        let label = self.label.apply_to(pad_label(label));
        let _ = self.term.write_line(&format!("{label} {value}"));
    }

    pub(crate) fn built(&self, summary: &BuildSummary) {
        self.done(&built_message(summary.documents, &summary.output_dir));
    }

    pub(crate) fn checked(&self, documents: usize) {
        self.done(&checked_message(documents));
    }

    pub(crate) fn error(&self, err: &dyn std::error::Error) {
        let line = self.failed.apply_to(format!("Error: {err}"));
        let _ = self.term.write_line(&line.to_string());
    }

    fn done(&self, msg: &str) {
        let _ = self.term.write_line(&self.done.apply_to(msg).to_string());
    }
}

fn pad_label(label: &str) -> String {
    format!("{:<LABEL_WIDTH$}", format!("{label}:"))
}

fn documents(count: usize) -> String {
    if count == 1 {
        "1 document".to_owned()
    } else {
        format!("{count} documents")
    }
}

fn built_message(count: usize, output_dir: &Path) -> String {
    format!("Built {} into {}", documents(count), output_dir.display())
}

fn checked_message(count: usize) -> String {
    format!("Checked {}: all tags valid", documents(count))
}
