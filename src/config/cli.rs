use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::PathBuf;

/// Files under `base_path`; relative paths given to the pipelines resolve
/// against it and absolute paths are used as they are.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for LocalStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve(path))?;
        Ok(data)
    }

    fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn display_path(&self, path: &str) -> String {
        let full_path = self.resolve(path);
        let shown = full_path.strip_prefix(".").unwrap_or(full_path.as_path());
        shown.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write_file("figures/nested/chart.svg", b"<svg/>").unwrap();

        assert!(storage.exists("figures/nested/chart.svg"));
        assert_eq!(storage.read_file("figures/nested/chart.svg").unwrap(), b"<svg/>");
        assert!(dir.path().join("figures/nested/chart.svg").is_file());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(!storage.exists("data/report.xlsx"));
        assert!(storage.read_file("data/report.xlsx").is_err());
        // Directories are not readable reports.
        fs::create_dir_all(dir.path().join("data")).unwrap();
        assert!(!storage.exists("data"));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(LocalStorage::default().display_path("figures/a.svg"), "figures/a.svg");

        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert_eq!(
            storage.display_path("a.svg"),
            dir.path().join("a.svg").display().to_string()
        );
    }
}
