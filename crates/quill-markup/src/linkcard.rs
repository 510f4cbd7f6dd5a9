//! `{% linkcard URL [Title...] [archive:URL] %}` preview cards.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::error::MarkupError;

const ARCHIVE_PREFIX: &str = "archive:";

/// Parsed link card arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCard {
    pub url: String,
    pub title: Option<String>,
    /// Explicit archive URL given in the tag; skips the archive lookup.
    pub archive: Option<String>,
}

impl LinkCard {
    /// Parse tag arguments.
    ///
    /// The first token is the URL. A token starting with `archive:` anywhere
    /// after it sets the archive URL; the remaining tokens form the title.
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let mut tokens = markup.split_whitespace();
        let url = tokens
            .next()
            .map(strip_outer_quotes)
            .filter(|url| !url.is_empty())
            .ok_or(MarkupError::MissingLinkCardUrl)?
            .to_owned();

        let mut archive = None;
        let mut title_words = Vec::new();
        for token in tokens {
            match token.strip_prefix(ARCHIVE_PREFIX) {
                Some(explicit) if archive.is_none() => {
                    archive = Some(strip_outer_quotes(explicit).to_owned());
                }
                _ => title_words.push(token),
            }
        }

        let title = title_words.join(" ");
        let title = strip_outer_quotes(&title);
        Ok(Self {
            url,
            title: (!title.is_empty()).then(|| title.to_owned()),
            archive: archive.filter(|archive| !archive.is_empty()),
        })
    }

    /// URL as displayed in the card, without the `http(s)://` scheme.
    #[must_use]
    pub fn display_url(&self) -> &str {
        self.url
            .strip_prefix("https://")
            .or_else(|| self.url.strip_prefix("http://"))
            .unwrap_or(&self.url)
    }

    /// Render the card. An empty `archive_url` omits the archive link.
    ///
    /// The output contains no blank lines, so markdown keeps it as a single
    /// HTML block.
    #[must_use]
    pub fn render(&self, archive_url: &str) -> String {
        let mut html = String::from(
            "<blockquote class=\"link-card\" style=\"text-align: center; position: relative; padding-bottom: 1.75rem;\">\n",
        );
        if let Some(title) = &self.title {
            let _ = writeln!(html, "<h1>{}</h1>", encode_text(title));
        }
        let _ = writeln!(
            html,
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
            encode_double_quoted_attribute(&self.url),
            encode_text(self.display_url()),
        );
        if !archive_url.trim().is_empty() {
            let _ = writeln!(
                html,
                "<small style=\"position: absolute; right: 0.75rem; bottom: 0.5rem;\">(<a href=\"{}\" target=\"_blank\" rel=\"noopener\">archive</a>)</small>",
                encode_double_quoted_attribute(archive_url),
            );
        }
        html.push_str("</blockquote>");
        html
    }
}

/// Remove one pair of matching outer quotes.
pub(crate) fn strip_outer_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
