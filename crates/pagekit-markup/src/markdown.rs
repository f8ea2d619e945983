//! Markdown to HTML conversion.

use pulldown_cmark::{html, Options, Parser};

use crate::node::Node;

/// Render CommonMark source to an HTML string.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(source, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

/// Render CommonMark source into a raw markup node.
pub fn markdown(source: &str) -> Node {
    Node::Raw(render_markdown(source))
}
