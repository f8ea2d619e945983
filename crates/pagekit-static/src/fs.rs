//! Filesystem helpers for the build pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Recursively remove a directory tree.
///
/// Returns `Ok(false)` if there was nothing to remove.
pub async fn remove_dir_all_if_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create any missing ancestors of `path`, then write `contents` to it.
///
/// The file is created if missing and truncated otherwise.
pub async fn ensure_dirs_and_write(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await
}

/// Check that `dir` exists and is a directory.
pub fn check_assets_dir(dir: &Path) -> Result<(), BuildError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(BuildError::AssetsNotDirectory(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BuildError::AssetsNotFound(dir.to_path_buf()))
        }
        Err(source) => Err(BuildError::CopyError {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Refuse to copy `from` into a directory that lives inside it.
///
/// Both paths are resolved through symlinks first. `to` may not exist yet; its
/// nearest existing ancestor is resolved instead.
pub fn check_output_outside_assets(from: &Path, to: &Path) -> Result<(), BuildError> {
    if let (Ok(assets), Ok(output)) = (resolve(from), resolve(to)) {
        if output.starts_with(&assets) {
            return Err(BuildError::AssetsContainOutput {
                assets: from.to_path_buf(),
                output: to.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Canonicalize `path`, tolerating trailing components that do not exist yet.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(canonical, |acc: PathBuf, part| acc.join(part)))
            }
            Err(e) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Err(e),
            },
        }
    }
}

/// Recursively copy the contents of `from` into `to`, overwriting existing files.
///
/// Symlinks are followed: the files they point at are copied, not the links.
/// Returns the number of files copied.
pub fn copy_dir(from: &Path, to: &Path) -> Result<usize, BuildError> {
    check_assets_dir(from)?;
    check_output_outside_assets(from, to)?;

    let mut copied = 0;

    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(|e| BuildError::CopyError {
            path: e.path().unwrap_or(from).to_path_buf(),
            source: e.into(),
        })?;

        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| BuildError::CopyError {
                path: target.clone(),
                source,
            })?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::CopyError {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::copy(entry.path(), &target).map_err(|source| BuildError::CopyError {
            path: target.clone(),
            source,
        })?;

        tracing::debug!("Copied {}", relative.display());
        copied += 1;
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_file_and_creates_parents() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a/b/c/index.html");

        ensure_dirs_and_write(&path, "<p>hi</p>").await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn truncates_existing_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("index.html");
        fs::write(&path, "a much longer previous body").unwrap();

        ensure_dirs_and_write(&path, "short").await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[tokio::test]
    async fn write_fails_when_parent_is_a_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("blocker"), "").unwrap();

        let result = ensure_dirs_and_write(&temp.path().join("blocker/index.html"), "x").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn removing_missing_dir_is_not_an_error() {
        let temp = tempdir().unwrap();

        let removed = remove_dir_all_if_exists(&temp.path().join("nope"))
            .await
            .unwrap();

        assert!(!removed);
    }

    #[tokio::test]
    async fn removes_nested_tree() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("deep/er")).unwrap();
        fs::write(out.join("deep/er/file.txt"), "x").unwrap();

        let removed = remove_dir_all_if_exists(&out).await.unwrap();

        assert!(removed);
        assert!(!out.exists());
    }

    #[test]
    fn copies_nested_tree() {
        let temp = tempdir().unwrap();
        let from = temp.path().join("static");
        let to = temp.path().join("out");
        fs::create_dir_all(from.join("css")).unwrap();
        fs::create_dir_all(from.join("empty")).unwrap();
        fs::write(from.join("robots.txt"), "User-agent: *").unwrap();
        fs::write(from.join("css/site.css"), "body {}").unwrap();

        let copied = copy_dir(&from, &to).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(to.join("robots.txt")).unwrap(), "User-agent: *");
        assert_eq!(fs::read_to_string(to.join("css/site.css")).unwrap(), "body {}");
        assert!(to.join("empty").is_dir());
    }

    #[test]
    fn copy_overwrites_existing_files() {
        let temp = tempdir().unwrap();
        let from = temp.path().join("static");
        let to = temp.path().join("out");
        fs::create_dir_all(&from).unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(from.join("index.html"), "asset").unwrap();
        fs::write(to.join("index.html"), "page").unwrap();
        fs::write(to.join("other.html"), "kept").unwrap();

        copy_dir(&from, &to).unwrap();

        assert_eq!(fs::read_to_string(to.join("index.html")).unwrap(), "asset");
        assert_eq!(fs::read_to_string(to.join("other.html")).unwrap(), "kept");
    }

    #[test]
    fn copy_from_missing_dir_fails() {
        let temp = tempdir().unwrap();

        let result = copy_dir(&temp.path().join("missing"), &temp.path().join("out"));

        assert!(matches!(result, Err(BuildError::AssetsNotFound(_))));
    }

    #[test]
    fn copy_into_own_subdirectory_fails() {
        let temp = tempdir().unwrap();
        let from = temp.path().join("static");
        fs::create_dir_all(from.join("out")).unwrap();
        fs::write(from.join("logo.svg"), "<svg/>").unwrap();

        let result = copy_dir(&from, &from.join("out"));

        assert!(matches!(
            result,
            Err(BuildError::AssetsContainOutput { .. })
        ));
        assert!(!from.join("out/out").exists());
        assert!(!from.join("out/logo.svg").exists());
    }

    #[test]
    fn copy_into_itself_fails() {
        let temp = tempdir().unwrap();
        let from = temp.path().join("static");
        fs::create_dir_all(&from).unwrap();

        let result = check_output_outside_assets(&from, &from);

        assert!(matches!(
            result,
            Err(BuildError::AssetsContainOutput { .. })
        ));
    }

    #[test]
    fn sibling_directories_are_allowed() {
        let temp = tempdir().unwrap();
        let from = temp.path().join("static");
        fs::create_dir_all(&from).unwrap();

        // "static-out" shares a string prefix with "static" but is not inside it.
        let result = check_output_outside_assets(&from, &temp.path().join("static-out/site"));

        assert!(result.is_ok());
    }

    #[test]
    fn copy_from_file_fails() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        let result = copy_dir(&file, &temp.path().join("out"));

        assert!(matches!(result, Err(BuildError::AssetsNotDirectory(_))));
    }
}
