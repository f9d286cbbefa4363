//! Markdown rendering.
//!
//! Uses pulldown-cmark directly with GFM extensions (tables, strikethrough,
//! task lists, footnotes). Raw HTML blocks pass through unchanged per the
//! CommonMark spec.

use pulldown_cmark::{Options, Parser, html::push_html};

/// Render markdown to HTML.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES;

    let parser = Parser::new_ext(content, options);

    let mut html = String::with_capacity(content.len() * 2);
    push_html(&mut html, parser);
    html
}
