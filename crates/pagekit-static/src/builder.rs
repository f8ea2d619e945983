//! Static site builder.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::task::JoinSet;

use crate::fs::{
    check_assets_dir, check_output_outside_assets, copy_dir, remove_dir_all_if_exists,
};
use crate::page::Page;

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig<M = ()> {
    /// Output directory. Deleted and recreated on every build.
    pub to: PathBuf,

    /// Pages to render
    pub pages: Vec<Page<M>>,

    /// Directory whose contents are copied over the output after pages are written
    pub copy_assets_from: Option<PathBuf>,
}

impl<M> BuildConfig<M> {
    /// Create a configuration with no pages.
    pub fn new(to: impl Into<PathBuf>) -> Self {
        Self {
            to: to.into(),
            pages: Vec::new(),
            copy_assets_from: None,
        }
    }

    /// Add a page.
    pub fn page(mut self, page: Page<M>) -> Self {
        self.pages.push(page);
        self
    }

    /// Add several pages.
    pub fn pages(mut self, pages: impl IntoIterator<Item = Page<M>>) -> Self {
        self.pages.extend(pages);
        self
    }

    /// Copy the contents of `dir` into the output after rendering.
    pub fn copy_assets_from(mut self, dir: impl Into<PathBuf>) -> Self {
        self.copy_assets_from = Some(dir.into());
        self
    }
}

impl<M> Default for BuildConfig<M> {
    fn default() -> Self {
        Self::new("out")
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages written
    pub pages: usize,

    /// Number of asset files copied
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid output directory: {0:?}")]
    InvalidOutputDir(PathBuf),

    #[error("Assets directory not found: {0}")]
    AssetsNotFound(PathBuf),

    #[error("Assets path is not a directory: {0}")]
    AssetsNotDirectory(PathBuf),

    #[error("Output directory {output} is inside assets directory {assets}")]
    AssetsContainOutput { assets: PathBuf, output: PathBuf },

    #[error("Failed to clean output directory {path}: {source}")]
    CleanError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to render page {path}: {message}")]
    RenderError { path: String, message: String },

    #[error("Failed to write output {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to copy assets at {path}: {source}")]
    CopyError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Build task failed: {0}")]
    TaskError(String),
}

/// Static site builder.
pub struct StaticBuilder<M = ()> {
    config: BuildConfig<M>,
}

impl<M> StaticBuilder<M> {
    /// Create a new static builder.
    pub fn new(config: BuildConfig<M>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig<M> {
        &self.config
    }

    /// Build the static site.
    ///
    /// Deletes the output directory, renders every page concurrently, then copies
    /// assets. The first failing page fails the build; pages already in flight are
    /// left to finish, so the output may be partially written.
    ///
    /// The output and assets paths are checked before anything is deleted. A missing
    /// assets directory, or an output directory nested inside it, fails the build
    /// with the previous output left untouched.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let output_dir = &self.config.to;

        self.validate()?;

        tracing::info!(
            "Building {} pages into {}",
            self.config.pages.len(),
            output_dir.display()
        );

        self.clean_output_dir().await?;

        let pages = self.render_pages().await?;

        let assets = match &self.config.copy_assets_from {
            Some(from) => self.copy_assets(from).await?,
            None => 0,
        };

        let duration = start.elapsed();

        Ok(BuildResult {
            pages,
            assets,
            duration_ms: duration.as_millis() as u64,
            output_dir: output_dir.clone(),
        })
    }

    /// Reject configurations that cannot produce a build.
    fn validate(&self) -> Result<(), BuildError> {
        if self.config.to.as_os_str().is_empty() {
            return Err(BuildError::InvalidOutputDir(self.config.to.clone()));
        }

        if let Some(from) = &self.config.copy_assets_from {
            check_assets_dir(from)?;
            check_output_outside_assets(from, &self.config.to)?;
        }

        Ok(())
    }

    /// Delete the output directory and recreate it empty.
    async fn clean_output_dir(&self) -> Result<(), BuildError> {
        let output_dir = &self.config.to;
        let clean_error = |source| BuildError::CleanError {
            path: output_dir.clone(),
            source,
        };

        if remove_dir_all_if_exists(output_dir)
            .await
            .map_err(clean_error)?
        {
            tracing::debug!("Removed previous output at {}", output_dir.display());
        }

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(clean_error)
    }

    /// Render and write all pages, one task per page.
    async fn render_pages(&self) -> Result<usize, BuildError> {
        let mut tasks = JoinSet::new();

        for page in &self.config.pages {
            tasks.spawn(page.job(&self.config.to).run());
        }

        let mut written = 0;

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| BuildError::TaskError(e.to_string()))
                .and_then(|result| result);

            match outcome {
                Ok(path) => {
                    tracing::debug!("Built page {}", path.display());
                    written += 1;
                }
                Err(e) => {
                    if !tasks.is_empty() {
                        tracing::warn!(
                            "Build failed with {} pages still being written",
                            tasks.len()
                        );
                    }
                    // Remaining pages run to completion in the background.
                    tasks.detach_all();
                    return Err(e);
                }
            }
        }

        Ok(written)
    }

    /// Copy the assets directory over the output.
    async fn copy_assets(&self, from: &Path) -> Result<usize, BuildError> {
        let from = from.to_path_buf();
        let to = self.config.to.clone();

        let copied = tokio::task::spawn_blocking(move || copy_dir(&from, &to))
            .await
            .map_err(|e| BuildError::TaskError(e.to_string()))??;

        tracing::info!("Copied {} asset files", copied);

        Ok(copied)
    }
}

/// Build a site from `config`.
pub async fn build<M>(config: BuildConfig<M>) -> Result<BuildResult, BuildError> {
    StaticBuilder::new(config).build().await
}
