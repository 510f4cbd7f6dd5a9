//! Attribute-aware tag scanning without a DOM.
//!
//! Rendered output comes from a trusted markdown renderer, so opening tags are
//! well formed and keep their attributes on one line. [`RegexTagExtractor`]
//! relies on that to locate `<img src>` and `<a href>` occurrences with plain
//! regular expressions. Passes only talk to the [`TagExtractor`] trait, so a
//! structural parser can replace the regex scanner without touching them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `<img ... src="..." ...>` with single or double quotes.
static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\s+((?:[^>]*?\s)?)src\s*=\s*(?:"([^"]*)"|'([^']*)')([^>]*)>"#).unwrap()
});

/// `<a ... href="..." ...>` with single or double quotes.
static ANCHOR_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s+((?:[^>]*?\s)?)href\s*=\s*(?:"([^"]*)"|'([^']*)')([^>]*)>"#).unwrap()
});

/// Elements the scanner knows how to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagName {
    /// `<img>`, keyed on its `src` attribute.
    Img,
    /// `<a>`, keyed on its `href` attribute.
    Anchor,
}

impl TagName {
    /// Element name as written in markup.
    #[must_use]
    pub fn element(self) -> &'static str {
        match self {
            Self::Img => "img",
            Self::Anchor => "a",
        }
    }

    /// Attribute carrying the element's target URL.
    #[must_use]
    pub fn target_attr(self) -> &'static str {
        match self {
            Self::Img => "src",
            Self::Anchor => "href",
        }
    }
}

/// An opening tag split around its target attribute.
///
/// `<a class="x" href='/y' title="z">` becomes `before = "class=\"x\" "`,
/// `quote = '\''`, `value = "/y"`, `after = " title=\"z\""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTag<'a> {
    /// Element kind.
    pub name: TagName,
    /// Full text of the opening tag as it appears in the input.
    pub text: &'a str,
    /// Attributes preceding the target attribute (ends with whitespace or is empty).
    pub before: &'a str,
    /// Quote character used around the target value.
    pub quote: char,
    /// Target attribute value, exactly as written (not unescaped).
    pub value: &'a str,
    /// Attributes following the target value, up to the closing `>`.
    pub after: &'a str,
}

impl ScannedTag<'_> {
    /// Rebuild the tag with a different target value, keeping quotes and
    /// surrounding attributes.
    #[must_use]
    pub fn with_value(&self, value: &str) -> String {
        format!(
            "<{} {}{}={q}{value}{q}{}>",
            self.name.element(),
            self.before,
            self.name.target_attr(),
            self.after,
            q = self.quote,
        )
    }

    /// Rebuild the tag with `extra` appended right before the closing `>`.
    ///
    /// `extra` is expected to start with a space. A self-closing `/` stays last.
    #[must_use]
    pub fn with_appended(&self, extra: &str) -> String {
        let (after, self_closing) = split_self_closing(self.after);
        format!(
            "<{} {}{}={q}{}{q}{after}{extra}{}>",
            self.name.element(),
            self.before,
            self.name.target_attr(),
            self.value,
            if self_closing { " /" } else { "" },
            q = self.quote,
        )
    }
}

/// Locates opening tags and lets a callback rewrite them.
pub trait TagExtractor: Send + Sync {
    /// Rewrite every opening tag of kind `name` that carries its target attribute.
    ///
    /// The callback returns `Some(replacement)` to substitute the whole opening
    /// tag, or `None` to leave it untouched. Text outside matched tags is copied
    /// through unchanged.
    fn rewrite(
        &self,
        html: &str,
        name: TagName,
        rewrite: &mut dyn FnMut(&ScannedTag<'_>) -> Option<String>,
    ) -> String;
}

/// [`TagExtractor`] backed by attribute-aware regular expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexTagExtractor;

impl TagExtractor for RegexTagExtractor {
    fn rewrite(
        &self,
        html: &str,
        name: TagName,
        rewrite: &mut dyn FnMut(&ScannedTag<'_>) -> Option<String>,
    ) -> String {
        let re = match name {
            TagName::Img => &*IMG_SRC_RE,
            TagName::Anchor => &*ANCHOR_HREF_RE,
        };

        re.replace_all(html, |caps: &Captures| {
            let tag = scanned_tag(name, caps);
            rewrite(&tag).unwrap_or_else(|| tag.text.to_owned())
        })
        .into_owned()
    }
}

fn scanned_tag<'h>(name: TagName, caps: &Captures<'h>) -> ScannedTag<'h> {
    let (quote, value) = match (caps.get(2), caps.get(3)) {
        (Some(double), _) => ('"', double.as_str()),
        (None, Some(single)) => ('\'', single.as_str()),
        (None, None) => ('"', ""),
    };
    ScannedTag {
        name,
        text: caps.get(0).map_or("", |m| m.as_str()),
        before: caps.get(1).map_or("", |m| m.as_str()),
        quote,
        value,
        after: caps.get(4).map_or("", |m| m.as_str()),
    }
}

/// Split a trailing self-closing `/` off an attribute tail.
///
/// Returns the tail without the slash (and without whitespace before it) and
/// whether a slash was present.
pub(crate) fn split_self_closing(attrs: &str) -> (&str, bool) {
    let trimmed = attrs.trim_end();
    match trimmed.strip_suffix('/') {
        Some(rest) => (rest.trim_end(), true),
        None => (attrs, false),
    }
}

/// Whether `tag` already declares attribute `name` (`name` followed by `=`).
///
/// Matching is ASCII case-insensitive. The name must start the string or
/// follow whitespace, so neither `title=` nor `data-width=` counts as `le=` or
/// `width=`.
#[must_use]
pub fn has_attribute(tag: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let haystack = tag.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();

    haystack.match_indices(&needle).any(|(idx, _)| {
        let at_boundary = haystack[..idx]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        at_boundary && haystack[idx + needle.len()..].trim_start().starts_with('=')
    })
}

/// Whether `tag` declares `name` as a bare (valueless) attribute.
#[must_use]
pub fn has_bare_attribute(tag: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let haystack = tag.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();

    haystack.match_indices(&needle).any(|(idx, _)| {
        let after_space = haystack[..idx]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let ends_attr = haystack[idx + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c == '>' || c == '/');
        after_space && ends_attr
    })
}

/// Value of attribute `name` in an attribute string, if quoted.
#[must_use]
pub fn attribute_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let lower = attrs.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();

    for (idx, _) in lower.match_indices(&needle) {
        let at_boundary = lower[..idx]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        if !at_boundary {
            continue;
        }
        let rest = attrs[idx + needle.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let body = &rest[1..];
        return body.find(quote).map(|end| &body[..end]);
    }
    None
}
