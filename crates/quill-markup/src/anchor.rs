//! Anchor enclosure detection.

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<a[\s>]").unwrap());
static ANCHOR_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</a\s*>").unwrap());

/// Decides whether a position in an HTML buffer sits inside an `<a>` element.
pub trait AnchorScope: Send + Sync {
    /// `preceding` is all text before the position in question.
    fn is_enclosed(&self, preceding: &str) -> bool;
}

/// Backward scan: enclosed when the last opening anchor tag comes after the
/// last closing one (or there is an opening tag and no closing tag at all).
///
/// Nesting is not tracked.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackwardScan;

impl AnchorScope for BackwardScan {
    fn is_enclosed(&self, preceding: &str) -> bool {
        let last_open = ANCHOR_OPEN_RE.find_iter(preceding).last().map(|m| m.start());
        let last_close = ANCHOR_CLOSE_RE.find_iter(preceding).last().map(|m| m.start());

        match (last_open, last_close) {
            (Some(open), Some(close)) => open > close,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
