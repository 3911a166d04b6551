//! The Markdown-to-HTML seam and its default pulldown-cmark backend.

use pulldown_cmark::{Options, Parser, html};

/// Converts Markdown text to HTML.
///
/// An infallible collaborator: worst case, the converter returns its input
/// treated as plain Markdown. Conversion is the optional final phase of a
/// node's render; nodes opt out via their render options.
pub trait MarkdownConverter {
    /// Converts `markdown` to an HTML string.
    fn convert(&self, markdown: &str) -> String;
}

/// Default converter backed by pulldown-cmark.
///
/// Tables, footnotes, strikethrough, and task lists are enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkConverter;

impl CmarkConverter {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownConverter for CmarkConverter {
    fn convert(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
