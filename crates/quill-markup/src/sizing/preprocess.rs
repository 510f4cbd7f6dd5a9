//! Source pass rewriting `![alt](src =WxH)` into marker form.
//!
//! The renderer does not understand the sizing suffix, so it is moved into an
//! HTML comment right after the image: `![alt](src)<!-- IMG_SIZE:W:H -->`.
//! Fenced code blocks and inline code spans are left alone.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::marker::ImageSize;
use crate::fence::FenceTracker;

/// Cheap whole-document check for any sizing syntax.
static HAS_SIZING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\s+=.*?\)").unwrap());

static SIZED_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^\s)]+)\s+=([^)]+)\)").unwrap());

static BACKTICKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`+").unwrap());

/// Rewrite sizing syntax in markdown source.
///
/// Returns the input unchanged (borrowed) when nothing was rewritten.
pub fn preprocess(content: &str) -> Cow<'_, str> {
    if !HAS_SIZING_RE.is_match(content) {
        return Cow::Borrowed(content);
    }

    let mut fence = FenceTracker::new();
    let mut changed = 0usize;
    let lines: Vec<Cow<'_, str>> = content
        .split('\n')
        .map(|line| {
            if fence.skip(line) {
                return Cow::Borrowed(line);
            }
            let processed = process_line(line);
            if matches!(processed, Cow::Owned(_)) {
                changed += 1;
            }
            processed
        })
        .collect();

    if changed == 0 {
        return Cow::Borrowed(content);
    }

    tracing::debug!(lines = changed, "Rewrote image sizing syntax");
    Cow::Owned(lines.join("\n"))
}

/// Rewrite one line, skipping text inside inline code spans.
///
/// Every run of backticks toggles the inline-code state.
fn process_line(line: &str) -> Cow<'_, str> {
    if !line.contains("![") {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len() + 32);
    let mut in_code = false;
    let mut last = 0;
    let mut changed = false;

    for run in BACKTICKS_RE.find_iter(line) {
        changed |= push_segment(&mut out, &line[last..run.start()], in_code);
        out.push_str(run.as_str());
        in_code = !in_code;
        last = run.end();
    }
    changed |= push_segment(&mut out, &line[last..], in_code);

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(line)
    }
}

fn push_segment(out: &mut String, segment: &str, in_code: bool) -> bool {
    if in_code {
        out.push_str(segment);
        return false;
    }
    match rewrite_segment(segment) {
        Cow::Borrowed(text) => {
            out.push_str(text);
            false
        }
        Cow::Owned(text) => {
            out.push_str(&text);
            true
        }
    }
}

fn rewrite_segment(segment: &str) -> Cow<'_, str> {
    let mut rewritten = false;
    let result = SIZED_IMAGE_RE.replace_all(segment, |caps: &Captures| {
        rewritten = true;
        let size = ImageSize::parse(&caps[3]);
        if size.is_auto() {
            return format!("![{}]({})", &caps[1], &caps[2]);
        }
        format!("![{}]({}){}", &caps[1], &caps[2], size.marker())
    });

    if rewritten {
        Cow::Owned(result.into_owned())
    } else {
        Cow::Borrowed(segment)
    }
}
