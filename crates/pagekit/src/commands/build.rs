//! Static site build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pagekit_markup::{doctype, element, fragment, raw, render_markdown, Node};
use pagekit_static::{BuildConfig, Page, StaticBuilder};
use serde::Deserialize;

/// Manifest file structure (site.toml).
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    site: SiteConfig,
    #[serde(default)]
    pages: Vec<PageConfig>,
}

#[derive(Debug, Deserialize)]
struct SiteConfig {
    #[serde(default = "default_output")]
    to: String,
    copy_assets_from: Option<String>,
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_lang")]
    lang: String,
    /// Stylesheet URLs linked from every page
    #[serde(default)]
    stylesheets: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            to: default_output(),
            copy_assets_from: None,
            title: default_title(),
            lang: default_lang(),
            stylesheets: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageConfig {
    path: String,
    title: Option<String>,
    /// Markdown file, relative to the manifest
    source: Option<PathBuf>,
    /// Inline markdown
    body: Option<String>,
    #[serde(default)]
    metadata: toml::Table,
}

fn default_output() -> String {
    "out".to_string()
}
fn default_title() -> String {
    "Site".to_string()
}
fn default_lang() -> String {
    "en".to_string()
}

/// Load the manifest if it exists.
/// Returns an error if the file exists but is malformed.
fn load_config(config_path: &Path) -> Result<ConfigFile> {
    if config_path.exists() {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        tracing::info!("Loaded config from {}", config_path.display());
        return Ok(config);
    }
    tracing::warn!(
        "{} not found, building with defaults",
        config_path.display()
    );
    Ok(ConfigFile::default())
}

/// Shared page chrome.
#[derive(Debug, Clone)]
struct Layout {
    lang: String,
    site_title: String,
    stylesheets: Vec<String>,
}

impl Layout {
    fn render(&self, title: &str, body_html: &str) -> Node {
        let head = element("head")
            .child(element("meta").attr("charset", "utf-8"))
            .child(
                element("meta")
                    .attr("name", "viewport")
                    .attr("content", "width=device-width, initial-scale=1"),
            )
            .child(element("title").text(title))
            .children(
                self.stylesheets
                    .iter()
                    .map(|href| element("link").attr("rel", "stylesheet").attr("href", href)),
            );

        let html = element("html")
            .attr("lang", &self.lang)
            .child(head)
            .child(element("body").child(raw(body_html)));

        fragment(vec![doctype(), html.into()])
    }
}

/// Turn manifest entries into page descriptors.
///
/// Markdown is read and converted up front so content functions stay pure.
fn site_pages(config: &ConfigFile, base_dir: &Path) -> Result<Vec<Page<toml::Table>>> {
    let layout = Layout {
        lang: config.site.lang.clone(),
        site_title: config.site.title.clone(),
        stylesheets: config.site.stylesheets.clone(),
    };

    config
        .pages
        .iter()
        .map(|page| -> Result<Page<toml::Table>> {
            let markdown = match (&page.source, &page.body) {
                (Some(source), None) => {
                    let source_path = base_dir.join(source);
                    fs::read_to_string(&source_path).with_context(|| {
                        format!(
                            "Failed to read source for page {}: {}",
                            page.path,
                            source_path.display()
                        )
                    })?
                }
                (None, Some(body)) => body.clone(),
                (Some(_), Some(_)) => {
                    anyhow::bail!("Page {} sets both `source` and `body`", page.path)
                }
                (None, None) => {
                    anyhow::bail!("Page {} needs either `source` or `body`", page.path)
                }
            };

            let body_html = render_markdown(&markdown);
            let title = match &page.title {
                Some(title) => format!("{} - {}", title, layout.site_title),
                None => layout.site_title.clone(),
            };
            let layout = layout.clone();

            Ok(
                Page::new(page.path.clone(), move || layout.render(&title, &body_html))
                    .with_metadata(page.metadata.clone()),
            )
        })
        .collect()
}

/// Run the build command.
pub async fn run(
    config_path: PathBuf,
    output: Option<PathBuf>,
    assets: Option<PathBuf>,
) -> Result<()> {
    tracing::info!("Building static site...");

    let file_config = load_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or(Path::new(""));

    let pages = site_pages(&file_config, base_dir)?;

    let config = BuildConfig {
        to: output.unwrap_or_else(|| base_dir.join(&file_config.site.to)),
        pages,
        copy_assets_from: assets.or_else(|| {
            file_config
                .site
                .copy_assets_from
                .as_ref()
                .map(|dir| base_dir.join(dir))
        }),
    };

    let result = StaticBuilder::new(config).build().await?;

    tracing::info!(
        "Built {} pages and copied {} assets in {}ms",
        result.pages,
        result.assets,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_markup::Render;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[site]
to = "public"
copy_assets_from = "static"
title = "Test Site"
stylesheets = ["/style.css"]

[[pages]]
path = "index.html"
title = "Home"
source = "pages/index.md"

[[pages]]
path = "about/index.html"
body = "About *us*"

[pages.metadata]
nav_order = 2
"#;

    #[test]
    fn parses_manifest() {
        let config: ConfigFile = toml::from_str(MANIFEST).unwrap();

        assert_eq!(config.site.to, "public");
        assert_eq!(config.site.lang, "en");
        assert_eq!(config.pages.len(), 2);
        assert_eq!(
            config.pages[1].metadata.get("nav_order"),
            Some(&toml::Value::Integer(2))
        );
    }

    #[test]
    fn missing_manifest_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("site.toml")).unwrap();

        assert_eq!(config.site.to, "out");
        assert_eq!(config.site.title, "Site");
        assert!(config.pages.is_empty());
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site.toml");
        fs::write(&path, "[[pages]]\ntitle = \"no path\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_page_with_both_sources() {
        let config: ConfigFile = toml::from_str(
            "[[pages]]\npath = \"index.html\"\nsource = \"a.md\"\nbody = \"b\"\n",
        )
        .unwrap();

        let err = site_pages(&config, Path::new(".")).unwrap_err();

        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn rejects_page_without_content() {
        let config: ConfigFile = toml::from_str("[[pages]]\npath = \"index.html\"\n").unwrap();

        assert!(site_pages(&config, Path::new(".")).is_err());
    }

    #[test]
    fn renders_layout() {
        let config: ConfigFile = toml::from_str(
            "[site]\ntitle = \"Docs\"\n\n[[pages]]\npath = \"index.html\"\ntitle = \"Home\"\nbody = \"Hello\"\n",
        )
        .unwrap();

        let pages = site_pages(&config, Path::new(".")).unwrap();
        let html = pages[0].content().unwrap().render_to_static_markup().unwrap();

        assert!(html.starts_with("<!DOCTYPE html><html lang=\"en\"><head>"));
        assert!(html.contains("<meta charset=\"utf-8\"/>"));
        assert!(html.contains("<title>Home - Docs</title>"));
        assert!(html.contains("<body><p>Hello</p>\n</body></html>"));
    }

    #[tokio::test]
    async fn builds_site_from_manifest() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::create_dir_all(root.join("static")).unwrap();
        fs::write(root.join("site.toml"), MANIFEST).unwrap();
        fs::write(root.join("pages/index.md"), "# Welcome").unwrap();
        fs::write(root.join("static/style.css"), "body { margin: 0 }").unwrap();

        run(root.join("site.toml"), None, None).await.unwrap();

        let out = root.join("public");
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("<title>Home - Test Site</title>"));
        assert!(index.contains("<link rel=\"stylesheet\" href=\"/style.css\"/>"));
        assert!(index.contains("<h1>Welcome</h1>"));

        let about = fs::read_to_string(out.join("about/index.html")).unwrap();
        assert!(about.contains("<title>Test Site</title>"));
        assert!(about.contains("About <em>us</em>"));

        assert_eq!(
            fs::read_to_string(out.join("style.css")).unwrap(),
            "body { margin: 0 }"
        );
    }

    #[tokio::test]
    async fn output_override_wins() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(
            root.join("site.toml"),
            "[[pages]]\npath = \"index.html\"\nbody = \"Hi\"\n",
        )
        .unwrap();
        let custom = root.join("custom-out");

        run(root.join("site.toml"), Some(custom.clone()), None)
            .await
            .unwrap();

        assert!(custom.join("index.html").exists());
        assert!(!root.join("out").exists());
    }
}
