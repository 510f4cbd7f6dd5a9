//! Site-absolute image paths with optional CDN prefix.
//!
//! Markdown authors write image paths relative to the document. After
//! rendering, [`ImagePaths`] rewrites them to site-absolute URLs derived from
//! the document's location, so `dog.jpg` in `blog/2020/_posts/post.md`
//! becomes `/blog/2020/dog.jpg` (or `https://cdn.example.com/blog/2020/dog.jpg`
//! with a CDN base).

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::tag::{RegexTagExtractor, TagExtractor, TagName};

static IMAGE_EXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg|bmp|ico)(\?.*)?$").unwrap()
});

/// Directory segment that never appears in output URLs.
const POSTS_SEGMENT: &str = "_posts";

/// Normalized directory part of a document path.
///
/// Empty segments and `_posts` are dropped and one leading `_` is stripped
/// from each remaining segment.
///
/// ```
/// use quill_markup::relative_directory;
///
/// assert_eq!(relative_directory("blog/2020/_posts/2020-01-01-post.md"), "blog/2020");
/// assert_eq!(relative_directory("_drafts/idea.md"), "drafts");
/// assert_eq!(relative_directory("index.md"), "");
/// ```
#[must_use]
pub fn relative_directory(relative_path: &str) -> String {
    let Some((dir, _)) = relative_path.rsplit_once('/') else {
        return String::new();
    };

    dir.split('/')
        .filter(|segment| !segment.is_empty() && *segment != POSTS_SEGMENT)
        .map(|segment| segment.strip_prefix('_').unwrap_or(segment))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a normalized directory and a document-relative source into a
/// site-absolute path.
#[must_use]
pub fn build_absolute_src(relative_dir: &str, src: &str) -> String {
    let src = src.trim_start_matches('/');
    if relative_dir.is_empty() {
        format!("/{src}")
    } else {
        format!("/{relative_dir}/{src}")
    }
}

/// Whether `path` is already absolute (site-absolute, scheme-relative or
/// `http(s)`).
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://")
}

/// Resolve a document-relative path to a site-absolute one, prefixed by
/// `cdn_base` when non-empty. Absolute paths are returned unchanged.
#[must_use]
pub fn resolve(path: &str, relative_dir: &str, cdn_base: &str) -> String {
    if is_absolute(path) {
        return path.to_owned();
    }
    let absolute = build_absolute_src(relative_dir, path);
    format!("{cdn_base}{absolute}")
}

/// Whether `href` points at an image file (extension check, query allowed).
#[must_use]
pub fn is_image_path(href: &str) -> bool {
    IMAGE_EXT_RE.is_match(href)
}

/// Post-render pass rewriting `<img src>` and image-like `<a href>` values.
pub struct ImagePaths {
    cdn_base: String,
    extractor: Box<dyn TagExtractor>,
}

impl ImagePaths {
    /// Create the pass with the effective CDN base (empty for none).
    #[must_use]
    pub fn new(cdn_base: impl Into<String>) -> Self {
        Self {
            cdn_base: cdn_base.into(),
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
    pub fn cdn_base(&self) -> &str {
        &self.cdn_base
    }

    /// Rewrite image targets in `html` for the document at `relative_path`.
    ///
    /// Output without any `<img` is returned unchanged.
    pub fn rewrite<'a>(&self, html: &'a str, relative_path: &str) -> Cow<'a, str> {
        if !html.contains("<img") {
            return Cow::Borrowed(html);
        }

        let relative_dir = relative_directory(relative_path);
        let cdn_base = self.cdn_base.as_str();

        let html = self.extractor.rewrite(html, TagName::Img, &mut |tag| {
            Some(tag.with_value(&resolve(tag.value, &relative_dir, cdn_base)))
        });

        let html = self.extractor.rewrite(&html, TagName::Anchor, &mut |tag| {
            if is_image_path(tag.value) {
                Some(tag.with_value(&resolve(tag.value, &relative_dir, cdn_base)))
            } else {
                None
            }
        });

        tracing::debug!(path = relative_path, cdn_base, "Rewrote image paths");
        Cow::Owned(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relative_directory() {
        assert_eq!(relative_directory("blog/2020/_posts/post.md"), "blog/2020");
        assert_eq!(relative_directory("_posts/post.md"), "");
        assert_eq!(relative_directory("_notes/_drafts/x.md"), "notes/drafts");
        assert_eq!(relative_directory("a//b/x.md"), "a/b");
        assert_eq!(relative_directory("post.md"), "");
    }

    #[test]
    fn test_relative_directory_lone_underscore_dropped() {
        assert_eq!(relative_directory("_/a/x.md"), "a");
    }

    #[test]
    fn test_build_absolute_src() {
        assert_eq!(build_absolute_src("", "dog.jpg"), "/dog.jpg");
        assert_eq!(build_absolute_src("blog", "//dog.jpg"), "/blog/dog.jpg");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve("dog.jpg", "blog/2020", ""), "/blog/2020/dog.jpg");
        assert_eq!(
            resolve("img/dog.jpg", "blog/2020", "https://cdn.example.com"),
            "https://cdn.example.com/blog/2020/img/dog.jpg"
        );
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        for path in [
            "/dog.jpg",
            "//cdn.example.com/dog.jpg",
            "http://x.com/dog.jpg",
            "https://x.com/dog.jpg",
        ] {
            assert_eq!(resolve(path, "blog", "/cdn"), path);
        }
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path("dog.JPG"));
        assert!(is_image_path("dog.webp?v=2"));
        assert!(!is_image_path("page.html"));
        assert!(!is_image_path("dog.jpg.html"));
    }

    #[test]
    fn test_rewrite_img_and_image_links() {
        let pass = ImagePaths::new("/cdn");
        let html = r#"<p><a href='dog.png'><img src="dog.jpg" alt="Dog"></a> <a href="page.html">x</a></p>"#;

        let out = pass.rewrite(html, "blog/_posts/post.md");

        assert_eq!(
            out,
            r#"<p><a href='/cdn/blog/dog.png'><img src="/cdn/blog/dog.jpg" alt="Dog"></a> <a href="page.html">x</a></p>"#
        );
    }

    #[test]
    fn test_rewrite_skips_without_img() {
        let pass = ImagePaths::new("");
        let html = r#"<a href="dog.png">dog</a>"#;
        assert!(matches!(pass.rewrite(html, "a/b.md"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let pass = ImagePaths::new("");
        let once = pass.rewrite(r#"<img src="dog.jpg">"#, "a/b.md").into_owned();
        let twice = pass.rewrite(&once, "a/b.md").into_owned();
        assert_eq!(once, twice);
    }
}
