//! Unified diff rendering for the patch audit trail.
//!
//! Paths are repo-relative and rendered git-style (`a/<path>`, `b/<path>`,
//! `/dev/null` for a missing side). Headers are always written, even when the
//! texts are equal, so every touched file shows up in the trail.

use similar::TextDiff;

/// Renders unified diffs with a fixed amount of context.
#[derive(Debug, Clone, Copy)]
pub struct DiffRenderer {
    /// Number of unchanged lines around each change.
    pub context_lines: usize,
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self { context_lines: 3 }
    }
}

impl DiffRenderer {
    pub const fn new(context_lines: usize) -> Self {
        Self { context_lines }
    }

    /// Diff of a file modified in place.
    pub fn modified(&self, path: &str, old: &str, new: &str) -> String {
        self.render(&format!("a/{path}"), &format!("b/{path}"), old, new)
    }

    /// Diff of a newly written file. Content that is not valid UTF-8 is
    /// recorded as an opaque binary marker.
    pub fn created(&self, path: &str, content: &[u8]) -> String {
        match std::str::from_utf8(content) {
            Ok(text) => self.render("/dev/null", &format!("b/{path}"), "", text),
            Err(_) => format!("--- /dev/null\n+++ b/{path}\nBinary file\n"),
        }
    }

    /// Diff of a removed file, always as a binary marker.
    pub fn deleted(&self, path: &str) -> String {
        format!("--- a/{path}\n+++ /dev/null\nBinary file\n")
    }

    fn render(&self, old_label: &str, new_label: &str, old: &str, new: &str) -> String {
        let diff = TextDiff::from_lines(old, new);
        let mut unified = diff.unified_diff();
        unified
            .context_radius(self.context_lines)
            .missing_newline_hint(true);

        let mut out = format!("--- {old_label}\n+++ {new_label}\n");
        for hunk in unified.iter_hunks() {
            out.push_str(&hunk.to_string());
        }
        out
    }
}
