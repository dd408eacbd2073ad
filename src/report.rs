// Run tallies and the completion message shown to the operator.

use std::path::Path;

/// Counts for one run. Built fresh by the engine and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub uploaded: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Completion text distinguishing a clean run from one with failures.
pub fn summarize(summary: &RunSummary, log_file: &Path) -> String {
    if summary.is_clean() {
        "Upload complete with no errors!".to_string()
    } else {
        format!(
            "Upload complete with {} error(s). Please check {} for details about failed uploads.",
            summary.errors,
            log_file.display()
        )
    }
}
