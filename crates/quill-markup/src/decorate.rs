//! Pattern-driven link decoration.
//!
//! Every `<a href>` whose href matches at least one configured pattern gets the
//! merged attribute set of the global defaults and all matching patterns, minus
//! attributes the tag already declares.

use std::borrow::Cow;

use regex::Regex;

use crate::attrs::AttributeSet;
use crate::error::MarkupError;
use crate::tag::{RegexTagExtractor, TagExtractor, TagName, has_attribute, has_bare_attribute};

/// Compiled href pattern with its attribute overrides.
#[derive(Debug)]
pub struct PatternRule {
    pattern: Regex,
    properties: AttributeSet,
}

impl PatternRule {
    pub fn new(pattern: &str, properties: AttributeSet) -> Result<Self, MarkupError> {
        let compiled = Regex::new(pattern).map_err(|source| MarkupError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            properties,
        })
    }

    #[must_use]
    pub fn is_match(&self, href: &str) -> bool {
        self.pattern.is_match(href)
    }
}

/// Post-render pass adding configured attributes to matching links.
pub struct HrefDecorator {
    global: AttributeSet,
    rules: Vec<PatternRule>,
    extractor: Box<dyn TagExtractor>,
}

impl HrefDecorator {
    /// Compile the decorator from global defaults and ordered pattern rules.
    ///
    /// Fails on the first pattern that is not a valid regular expression.
    pub fn new<I, P>(global: AttributeSet, patterns: I) -> Result<Self, MarkupError>
    where
        I: IntoIterator<Item = (P, AttributeSet)>,
        P: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|(pattern, properties)| PatternRule::new(pattern.as_ref(), properties))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            global,
            rules,
            extractor: Box::new(RegexTagExtractor),
        })
    }

    /// Decorator with no rules; [`HrefDecorator::decorate`] is then a no-op.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            global: AttributeSet::new(),
            rules: Vec::new(),
            extractor: Box::new(RegexTagExtractor),
        }
    }

    /// Use a different tag extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn TagExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Merged properties for `href`, or `None` when no pattern matches.
    ///
    /// Starts from the global defaults and merges every matching rule over
    /// them in declaration order.
    #[must_use]
    pub fn properties_for(&self, href: &str) -> Option<AttributeSet> {
        let mut merged: Option<AttributeSet> = None;
        for rule in self.rules.iter().filter(|rule| rule.is_match(href)) {
            merged
                .get_or_insert_with(|| self.global.clone())
                .merge_over(&rule.properties);
        }
        merged
    }

    /// Add missing attributes to every matching anchor in `html`.
    pub fn decorate<'a>(&self, html: &'a str) -> Cow<'a, str> {
        if self.rules.is_empty() || !html.contains("<a") {
            return Cow::Borrowed(html);
        }

        let mut decorated = 0usize;
        let out = self.extractor.rewrite(html, TagName::Anchor, &mut |tag| {
            let properties = self.properties_for(tag.value)?;
            let missing = properties.render_filtered(|name, value| {
                has_attribute(tag.text, name)
                    || (value.is_bare() && has_bare_attribute(tag.text, name))
            });
            if missing.is_empty() {
                return None;
            }
            decorated += 1;
            Some(tag.with_appended(&missing))
        });

        tracing::debug!(decorated, "Decorated links");
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decorator() -> HrefDecorator {
        HrefDecorator::new(
            AttributeSet::new().with("target", "_blank"),
            [
                ("^https?://", AttributeSet::new().with("rel", "noopener")),
                ("/assets/", AttributeSet::new().with("download", true)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_decorate_external_link() {
        let out = decorator().decorate(r#"<p><a href="https://x.com">X</a></p>"#);
        assert_eq!(
            out,
            r#"<p><a href="https://x.com" target="_blank" rel="noopener">X</a></p>"#
        );
    }

    #[test]
    fn test_unmatched_link_untouched() {
        let html = r#"<a href="/about">About</a>"#;
        assert_eq!(decorator().decorate(html), html);
    }

    #[test]
    fn test_later_pattern_overrides() {
        let decorator = HrefDecorator::new(
            AttributeSet::new(),
            [
                ("example", AttributeSet::new().with("rel", "a")),
                ("example.com", AttributeSet::new().with("rel", "b")),
            ],
        )
        .unwrap();

        let props = decorator.properties_for("https://example.com").unwrap();
        assert_eq!(props.to_html(), r#" rel="b""#);
    }

    #[test]
    fn test_false_disables_global() {
        let decorator = HrefDecorator::new(
            AttributeSet::new().with("target", "_blank").with("rel", "noopener"),
            [("^/", AttributeSet::new().with("target", false))],
        )
        .unwrap();

        let out = decorator.decorate(r#"<a href="/local">L</a>"#);
        assert_eq!(out, r#"<a href="/local" rel="noopener">L</a>"#);
        assert!(!out.contains("false"));
    }

    #[test]
    fn test_existing_attribute_kept() {
        let out = decorator().decorate(r#"<a target="_self" href="https://x.com">X</a>"#);
        assert_eq!(
            out,
            r#"<a target="_self" href="https://x.com" rel="noopener">X</a>"#
        );
    }

    #[test]
    fn test_bare_attribute_and_single_quotes() {
        let out = decorator().decorate("<a href='/assets/file.pdf'>PDF</a>");
        assert_eq!(out, "<a href='/assets/file.pdf' target=\"_blank\" download>PDF</a>");
    }

    #[test]
    fn test_idempotent() {
        let d = decorator();
        let once = d
            .decorate(r#"<a href="https://x.com/assets/a.pdf">A</a> <a href="/x">x</a>"#)
            .into_owned();
        let twice = d.decorate(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_rules_is_noop() {
        let html = r#"<a href="https://x.com">X</a>"#;
        assert!(matches!(HrefDecorator::disabled().decorate(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = HrefDecorator::new(AttributeSet::new(), [("(", AttributeSet::new())])
            .err()
            .unwrap();
        assert!(matches!(err, MarkupError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }
}
