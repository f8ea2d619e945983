//! Page descriptors.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use pagekit_markup::{Node, Render};

use crate::builder::BuildError;
use crate::fs::ensure_dirs_and_write;

/// Error type returned by fallible content functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type ContentFn = Arc<dyn Fn() -> Result<Node, BoxError> + Send + Sync>;

/// A page to be rendered by the builder.
///
/// `M` is caller-defined metadata. The builder never looks at it.
pub struct Page<M = ()> {
    path: PathBuf,
    metadata: Option<M>,
    content: ContentFn,
}

impl<M> Page<M> {
    /// Create a page whose content cannot fail.
    pub fn new<F, N>(path: impl Into<PathBuf>, content: F) -> Self
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Into<Node>,
    {
        Self::try_new(path, move || Ok::<_, BoxError>(content()))
    }

    /// Create a page whose content function may fail.
    pub fn try_new<F, N, E>(path: impl Into<PathBuf>, content: F) -> Self
    where
        F: Fn() -> Result<N, E> + Send + Sync + 'static,
        N: Into<Node>,
        E: Into<BoxError>,
    {
        Self {
            path: path.into(),
            metadata: None,
            content: Arc::new(move || -> Result<Node, BoxError> {
                content().map(Into::into).map_err(Into::into)
            }),
        }
    }

    /// Attach metadata to the page.
    pub fn with_metadata(mut self, metadata: M) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Path of the page relative to the output directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> Option<&M> {
        self.metadata.as_ref()
    }

    /// Invoke the content function.
    pub fn content(&self) -> Result<Node, BoxError> {
        (self.content)()
    }

    /// Where this page lands under `output_dir`.
    ///
    /// A leading root or drive prefix on the page path is dropped, so `/about.html`
    /// still ends up inside `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        let relative: PathBuf = self
            .path
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        output_dir.join(relative)
    }

    pub(crate) fn job(&self, output_dir: &Path) -> PageJob {
        PageJob {
            page_path: self.path.clone(),
            output_path: self.output_path(output_dir),
            content: Arc::clone(&self.content),
        }
    }
}

impl<M: Clone> Clone for Page<M> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            metadata: self.metadata.clone(),
            content: Arc::clone(&self.content),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for Page<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// The owned, metadata-free unit of work spawned for each page.
pub(crate) struct PageJob {
    page_path: PathBuf,
    output_path: PathBuf,
    content: ContentFn,
}

impl PageJob {
    /// Render the page and write it to disk.
    pub(crate) async fn run(self) -> Result<PathBuf, BuildError> {
        let render_error = |message: String| BuildError::RenderError {
            path: self.page_path.display().to_string(),
            message,
        };

        let node = (self.content)().map_err(|e| render_error(e.to_string()))?;
        let html = node
            .render_to_static_markup()
            .map_err(|e| render_error(e.to_string()))?;

        ensure_dirs_and_write(&self.output_path, &html)
            .await
            .map_err(|source| BuildError::WriteError {
                path: self.output_path.clone(),
                source,
            })?;

        tracing::debug!(
            "Wrote {} ({} bytes)",
            self.output_path.display(),
            html.len()
        );

        Ok(self.page_path)
    }
}
