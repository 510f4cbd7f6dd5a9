//! Markdown to HTML conversion.

use pulldown_cmark::{Options, Parser, html};

/// Converts a document's markdown body into HTML.
///
/// Raw HTML in the source must pass through unchanged: sizing markers and
/// expanded tags rely on it.
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// [`Renderer`] backed by pulldown-cmark with GFM tables and strikethrough.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        }
    }
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the parser options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
