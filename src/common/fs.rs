use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() { bail!("Path exists but is not a directory: {}", path.display()) }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Error unless the file already exists.
pub(crate) fn require_file_exists(path: &Path) -> Result<()> {
    if !path.exists() { bail!("File does not exist: {}", path.display()) }
    if !path.is_file() { bail!("Path exists but is not a file: {}", path.display()) }
    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent_exists(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir_exists(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());

        // Second call is a no-op.
        ensure_dir_exists(&nested).unwrap();
    }

    #[test]
    fn ensure_dir_rejects_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(ensure_dir_exists(&file).is_err());
    }

    #[test]
    fn require_file_reports_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = require_file_exists(&tmp.path().join("missing.shp")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(require_file_exists(tmp.path()).is_err());
    }

    #[test]
    fn ensure_parent_handles_bare_file_names() {
        ensure_parent_exists(Path::new("plot.svg")).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        ensure_parent_exists(&tmp.path().join("out/plot.svg")).unwrap();
        assert!(tmp.path().join("out").is_dir());
    }
}
