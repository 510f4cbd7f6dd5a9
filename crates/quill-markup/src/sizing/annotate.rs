//! Output passes turning sizing markers into attributes and linking sized images.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::marker::ImageSize;
use crate::anchor::{AnchorScope, BackwardScan};
use crate::tag::{attribute_value, has_attribute, split_self_closing};

/// Image immediately followed by a marker, optionally wrapped in a paragraph.
static MARKED_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<p>)?<img\s+([^>]*)><!-- IMG_SIZE:([^:]+):(\S+) -->(</p>)?").unwrap()
});

static STRAY_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- IMG_SIZE:[^:]+:\S+ -->").unwrap());

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(<p>)?(<img\s+([^>]*)>)(</p>)?").unwrap());

const MARKER_PREFIX: &str = "<!-- IMG_SIZE:";

/// Post-render sizing pass.
///
/// Pass A moves marker dimensions onto the preceding `<img>`. Pass B wraps
/// every sized image that is not already inside a link in an anchor to the
/// image itself.
pub struct SizingAnnotator {
    scope: Box<dyn AnchorScope>,
}

impl Default for SizingAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl SizingAnnotator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scope: Box::new(BackwardScan),
        }
    }

    /// Use a different enclosure check for pass B.
    #[must_use]
    pub fn with_scope(mut self, scope: Box<dyn AnchorScope>) -> Self {
        self.scope = scope;
        self
    }

    /// Run pass A then pass B.
    pub fn annotate<'a>(&self, html: &'a str) -> Cow<'a, str> {
        match self.apply_markers(html) {
            Cow::Borrowed(html) => self.link_sized_images(html),
            Cow::Owned(html) => Cow::Owned(self.link_sized_images(&html).into_owned()),
        }
    }

    /// Pass A: consume markers into `width`/`height` attributes.
    ///
    /// Markers not directly after an image are removed with a warning.
    pub fn apply_markers<'a>(&self, html: &'a str) -> Cow<'a, str> {
        if !html.contains(MARKER_PREFIX) {
            return Cow::Borrowed(html);
        }

        let sized = MARKED_IMAGE_RE.replace_all(html, |caps: &Captures| {
            let p_open = caps.get(1).map_or("", |m| m.as_str());
            let p_close = caps.get(5).map_or("", |m| m.as_str());
            let (attrs, self_closing) = split_self_closing(&caps[2]);
            let size = ImageSize::from_marker_fields(&caps[3], &caps[4]);

            format!(
                "{p_open}<img {}{}{}>{p_close}",
                attrs.trim_end(),
                size.attributes(),
                if self_closing { " /" } else { "" },
            )
        });

        let stray = STRAY_MARKER_RE.find_iter(&sized).count();
        if stray == 0 {
            return Cow::Owned(sized.into_owned());
        }

        tracing::warn!(count = stray, "Removing image size markers not attached to an image");
        Cow::Owned(STRAY_MARKER_RE.replace_all(&sized, "").into_owned())
    }

    /// Pass B: wrap sized images in a link to their source.
    pub fn link_sized_images<'a>(&self, html: &'a str) -> Cow<'a, str> {
        if !html.contains("<img") {
            return Cow::Borrowed(html);
        }

        let mut wrapped = 0usize;
        let out = IMAGE_RE.replace_all(html, |caps: &Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let attrs = &caps[3];

            if !(has_attribute(attrs, "width") || has_attribute(attrs, "height")) {
                return whole.to_owned();
            }
            let Some(src) = attribute_value(attrs, "src") else {
                return whole.to_owned();
            };
            let start = caps.get(0).map_or(0, |m| m.start());
            if self.scope.is_enclosed(&html[..start]) {
                return whole.to_owned();
            }

            wrapped += 1;
            let p_open = caps.get(1).map_or("", |m| m.as_str());
            let p_close = caps.get(4).map_or("", |m| m.as_str());
            format!(
                r#"{p_open}<a href="{src}" target="_blank" rel="noopener">{}</a>{p_close}"#,
                &caps[2]
            )
        });

        if wrapped == 0 {
            return Cow::Borrowed(html);
        }
        tracing::debug!(wrapped, "Linked sized images");
        Cow::Owned(out.into_owned())
    }
}
