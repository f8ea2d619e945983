//! Create a starter site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command in the current directory.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing pagekit site...");

    init_in(Path::new("."), yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'pagekit build' to render the site into out/.");

    Ok(())
}

/// Write starter files under `root`. Existing files are kept unless `overwrite` is set.
fn init_in(root: &Path, overwrite: bool) -> Result<()> {
    let files = [
        ("site.toml", DEFAULT_CONFIG),
        ("pages/index.md", DEFAULT_INDEX),
        ("pages/about.md", DEFAULT_ABOUT),
        ("static/style.css", DEFAULT_CSS),
    ];

    for (relative, contents) in files {
        let path = root.join(relative);

        if path.exists() && !overwrite {
            tracing::warn!("{} already exists. Use --yes to overwrite.", relative);
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", relative))?;
        tracing::info!("Created {}", relative);
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# pagekit configuration

[site]
# Output directory, deleted and rebuilt on every build
to = "out"

# Copied over the output after pages are rendered
copy_assets_from = "static"

title = "My Site"
lang = "en"
stylesheets = ["/style.css"]

[[pages]]
path = "index.html"
title = "Home"
source = "pages/index.md"

[[pages]]
path = "about/index.html"
title = "About"
source = "pages/about.md"
"#;

const DEFAULT_INDEX: &str = r#"# Welcome

This site was rendered by **pagekit**.

See the [about page](/about/).
"#;

const DEFAULT_ABOUT: &str = r#"# About

Every page is listed in `site.toml`. Edit the markdown under `pages/`
and run `pagekit build` again.
"#;

const DEFAULT_CSS: &str = r#"body {
  font-family: system-ui, -apple-system, sans-serif;
  line-height: 1.6;
  max-width: 48rem;
  margin: 2rem auto;
  padding: 0 1rem;
}
"#;
