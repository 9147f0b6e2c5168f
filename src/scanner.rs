use crate::error::{Error, Result};
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into.
pub const DEFAULT_EXCLUDED: &[&str] = &["target"];

/// Collects the `.rs` files of a project.
///
/// Files are returned sorted by path so that the resulting index, and every document built
/// from it, is the same from one run to the next. Hidden directories and the names in
/// [`DEFAULT_EXCLUDED`] are skipped.
///
/// ```no_run
/// use swagger_from_docs::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let result = FileScanner::new(PathBuf::from("./my-service")).scan().unwrap();
/// println!("Found {} source files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    excluded: Vec<String>,
}

pub struct ScanResult {
    pub rust_files: Vec<PathBuf>,
    /// Entries that could not be read; scanning continues past them
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            excluded: DEFAULT_EXCLUDED.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Also skips directories called `name`.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.push(name.into());
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// # Errors
    ///
    /// [`Error::IoError`] when the root is not a readable directory.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.is_dir() {
            return Err(Error::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root_path.display()),
            )));
        }

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_rust_file(entry.path()) => {
                    rust_files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Scanned {}: {} source files",
            self.root_path.display(),
            rust_files.len()
        );
        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || (entry.file_type().is_dir() && self.excluded.iter().any(|excluded| *excluded == name))
    }
}

fn is_rust_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("rs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn relative(result: &ScanResult, root: &Path) -> Vec<String> {
        result
            .rust_files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_scan_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/views")).unwrap();
        fs::write(root.join("src/views/books.rs"), "pub struct BookViewSet;").unwrap();
        fs::write(root.join("src/lib.rs"), "pub mod views;").unwrap();
        fs::write(root.join("src/api.rs"), "pub fn ping() {}").unwrap();
        fs::write(root.join("README.md"), "# service").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(
            relative(&result, root),
            vec!["src/api.rs", "src/lib.rs", "src/views/books.rs"]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_skips_target_and_hidden() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join("target/debug/build.rs"), "fn main() {}").unwrap();
        fs::write(root.join(".git/hook.rs"), "fn main() {}").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(relative(&result, root), vec!["main.rs"]);
    }

    #[test]
    fn test_scan_custom_exclusion() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("vendor")).unwrap();
        fs::write(root.join("vendor/dep.rs"), "pub fn dep() {}").unwrap();
        fs::write(root.join("lib.rs"), "").unwrap();

        let result = FileScanner::new(root.to_path_buf())
            .exclude("vendor")
            .scan()
            .unwrap();

        assert_eq!(relative(&result, root), vec!["lib.rs"]);
    }

    #[test]
    fn test_scan_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = FileScanner::new(temp_dir.path().join("missing"));

        assert!(matches!(scanner.scan(), Err(Error::IoError(_))));
    }
}
