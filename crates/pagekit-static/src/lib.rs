//! Static site builder.
//!
//! Renders a list of page descriptors to static HTML under an output directory,
//! then optionally copies a directory of static assets over the result.

pub mod builder;
pub mod fs;
pub mod page;

pub use builder::{build, BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use page::{BoxError, Page};
