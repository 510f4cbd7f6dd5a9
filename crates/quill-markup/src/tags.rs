//! Expansion of embedded `{% name args %}` tags in markdown source.

use std::borrow::Cow;
use std::sync::LazyLock;

use quill_archive::ArchiveResolver;
use regex::Regex;

use crate::email::{ObfuscationKeys, obfuscate};
use crate::error::MarkupError;
use crate::fence::FenceTracker;
use crate::linkcard::LinkCard;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%\s*(linkcard|email)(?:\s+(.*?))?\s*%\}").unwrap());

/// Expands `{% linkcard %}` and `{% email %}` tags outside fenced code.
pub struct TagExpander<'a> {
    archive: &'a ArchiveResolver,
    keys: &'a ObfuscationKeys,
}

impl<'a> TagExpander<'a> {
    #[must_use]
    pub fn new(archive: &'a ArchiveResolver, keys: &'a ObfuscationKeys) -> Self {
        Self { archive, keys }
    }

    /// Expand every tag in `content`.
    ///
    /// Fails on the first malformed tag.
    pub fn expand<'c>(&self, content: &'c str) -> Result<Cow<'c, str>, MarkupError> {
        if !TAG_RE.is_match(content) {
            return Ok(Cow::Borrowed(content));
        }

        let mut fence = FenceTracker::new();
        let mut out = String::with_capacity(content.len());
        let mut expanded = 0usize;

        for (idx, line) in content.split('\n').enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            if fence.skip(line) {
                out.push_str(line);
                continue;
            }

            let mut last = 0;
            for caps in TAG_RE.captures_iter(line) {
                let Some(whole) = caps.get(0) else { continue };
                let args = caps.get(2).map_or("", |m| m.as_str());
                out.push_str(&line[last..whole.start()]);
                out.push_str(&self.render(&caps[1], args)?);
                last = whole.end();
                expanded += 1;
            }
            out.push_str(&line[last..]);
        }

        if expanded == 0 {
            return Ok(Cow::Borrowed(content));
        }
        tracing::debug!(expanded, "Expanded embedded tags");
        Ok(Cow::Owned(out))
    }

    fn render(&self, name: &str, args: &str) -> Result<String, MarkupError> {
        match name {
            "linkcard" => {
                let card = LinkCard::parse(args)?;
                let archive = self.archive.resolve(&card.url, card.archive.as_deref());
                Ok(card.render(&archive))
            }
            _ => obfuscate(args, self.keys),
        }
    }
}
