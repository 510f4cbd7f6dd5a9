//! Image dimensions and the in-text marker that carries them across rendering.

use std::fmt;

/// Width and height requested for an image; `None` means `auto`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

const AUTO: &str = "auto";

impl ImageSize {
    /// Parse a sizing suffix: `WxH`, `Wx`, `xH` or `W`.
    ///
    /// Splits on the first `x`. A side that is empty, non-numeric or out of
    /// range becomes `auto`, so parsing never fails; check [`is_auto`] to see
    /// whether anything usable was found.
    ///
    /// ```
    /// use quill_markup::ImageSize;
    ///
    /// let size = ImageSize::parse("300x");
    /// assert_eq!(size.width, Some(300));
    /// assert_eq!(size.height, None);
    /// ```
    ///
    /// [`is_auto`]: Self::is_auto
    #[must_use]
    pub fn parse(dimension: &str) -> Self {
        let dimension = dimension.trim();
        let (width, height) = dimension.split_once('x').unwrap_or((dimension, ""));
        Self {
            width: parse_number(width),
            height: parse_number(height),
        }
    }

    /// Neither side is set.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Parse the two fields of a marker (`auto` or digits).
    ///
    /// Fields that are neither are treated as `auto`.
    #[must_use]
    pub fn from_marker_fields(width: &str, height: &str) -> Self {
        let field = |value: &str| if value == AUTO { None } else { parse_number(value) };
        Self {
            width: field(width),
            height: field(height),
        }
    }

    /// The marker comment placed right after the image in source text.
    #[must_use]
    pub fn marker(&self) -> String {
        format!("<!-- IMG_SIZE:{}:{} -->", Side(self.width), Side(self.height))
    }

    /// Attribute string for the set sides, e.g. ` width="300" height="200"`.
    #[must_use]
    pub fn attributes(&self) -> String {
        let mut out = String::new();
        if let Some(width) = self.width {
            out.push_str(&format!(" width=\"{width}\""));
        }
        if let Some(height) = self.height {
            out.push_str(&format!(" height=\"{height}\""));
        }
        out
    }
}

struct Side(Option<u32>);

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str(AUTO),
        }
    }
}

fn parse_number(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
