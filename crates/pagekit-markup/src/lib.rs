//! Element tree that renders to static HTML markup.
//!
//! Pages describe their content as a tree of [`Node`]s. Rendering produces a fully
//! resolved HTML string with no further evaluation needed to display it.

pub mod escape;
pub mod markdown;
pub mod node;

pub use escape::{escape, escape_into};
pub use markdown::{markdown, render_markdown};
pub use node::{doctype, element, fragment, raw, text, Attr, Element, Node, Render, RenderError};
