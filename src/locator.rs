//! Resolve logical template names against an ordered list of base directories

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::template::TemplateError;

/// Ordered set of validated, canonical base directories
///
/// Directories are canonicalized when added, so `templates`, `templates/` and
/// `./templates` are the same entry; the comparison itself is case-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileLocator {
    base_directories: Vec<PathBuf>,
}

impl FileLocator {
    /// Create a locator from base directories, validating each one
    pub fn new<I, P>(directories: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut locator = Self::default();
        for dir in directories {
            locator.add_base_directory(dir)?;
        }
        Ok(locator)
    }

    /// Append a base directory; duplicates are skipped silently
    pub fn add_base_directory(&mut self, dir: impl AsRef<Path>) -> Result<&mut Self, TemplateError> {
        let dir = dir.as_ref();
        let canonical = dir
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| TemplateError::InvalidConfiguration {
                path: dir.to_path_buf(),
            })?;

        if self.base_directories.contains(&canonical) {
            debug!(dir = %canonical.display(), "skipping duplicate base directory");
        } else {
            debug!(dir = %canonical.display(), "added base directory");
            self.base_directories.push(canonical);
        }
        Ok(self)
    }

    pub fn base_directories(&self) -> &[PathBuf] {
        &self.base_directories
    }

    /// First existing file for `relative`, searching directories in order
    ///
    /// Names with a root or `..` components never resolve.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, TemplateError> {
        let path = Path::new(relative);
        let contained = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if contained {
            if let Some(found) = self
                .base_directories
                .iter()
                .map(|dir| dir.join(path))
                .find(|candidate| candidate.is_file())
            {
                debug!(file = relative, path = %found.display(), "resolved template");
                return Ok(found);
            }
        }

        Err(TemplateError::file_not_found(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_first_match_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("page.html"), "first").unwrap();
        fs::write(second.path().join("page.html"), "second").unwrap();
        fs::write(second.path().join("only.html"), "second").unwrap();

        let locator = FileLocator::new([first.path(), second.path()]).unwrap();
        let page = locator.resolve("page.html").unwrap();
        assert_eq!(fs::read_to_string(page).unwrap(), "first");
        assert!(locator.resolve("only.html").unwrap().starts_with(second.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_missing_directory_is_invalid_configuration() {
        let err = FileLocator::new(["/definitely/not/here"]).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("/definitely/not/here"));
    }

    #[test]
    fn test_duplicate_directories_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let with_slash = format!("{}/", dir.path().display());
        let dotted = dir.path().join(".");
        let locator = FileLocator::new([
            dir.path().to_path_buf(),
            PathBuf::from(with_slash),
            dotted,
        ])
        .unwrap();
        assert_eq!(locator.base_directories().len(), 1);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FileLocator::new([dir.path()]).unwrap();
        let err = locator.resolve("nope.html").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_directories_and_escapes_do_not_resolve() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("partials/item.html"), "x").unwrap();
        let locator = FileLocator::new([dir.path().join("partials")]).unwrap();

        assert!(locator.resolve("item.html").is_ok());
        assert!(locator.resolve("../partials/item.html").is_err());
        assert!(locator.resolve("/etc/hostname").is_err());
        assert!(locator.resolve("").is_err());
        assert!(FileLocator::new([dir.path()]).unwrap().resolve("partials").is_err());
    }
}
