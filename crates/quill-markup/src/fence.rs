//! Code fence tracking for line-by-line source passes.
//!
//! Source passes must leave fenced code alone, so they feed every line through
//! a [`FenceTracker`] and skip the ones it reports as fence content.

/// Tracks code fence state during line-by-line processing.
///
/// A line starting with three backticks or three tildes toggles the state.
/// Fence character and length are not matched between the opening and the
/// closing line, and indented fence lines are treated as ordinary text.
#[derive(Debug, Default)]
pub struct FenceTracker {
    in_fence: bool,
}

impl FenceTracker {
    /// Create a new fence tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if currently inside a fenced code block.
    #[must_use]
    pub fn in_fence(&self) -> bool {
        self.in_fence
    }

    /// Update fence state based on a line.
    ///
    /// Returns `true` if the line is a fence marker (opening or closing).
    pub fn update(&mut self, line: &str) -> bool {
        if is_fence_line(line) {
            self.in_fence = !self.in_fence;
            return true;
        }
        false
    }

    /// Whether `line` should be left untouched: a fence marker or fence content.
    ///
    /// Updates state as a side effect, so call it exactly once per line.
    pub fn skip(&mut self, line: &str) -> bool {
        self.update(line) || self.in_fence
    }
}

fn is_fence_line(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}
