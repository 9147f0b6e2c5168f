use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parses source files with `syn`.
///
/// ```no_run
/// use swagger_from_docs::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/views.rs")).unwrap();
/// println!("{} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub syntax_tree: syn::File,
}

/// Outcome of parsing a batch of files.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub files: Vec<ParsedFile>,
    /// One error per file that could not be read or parsed
    pub failures: Vec<Error>,
}

impl AstParser {
    /// # Errors
    ///
    /// [`Error::IoError`] when the file cannot be read and [`Error::ParseError`] when it is
    /// not valid Rust.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse_source(path, &content)
    }

    /// Parses `content` as if read from `path`.
    pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses every file; failures are logged and collected, the rest still parse.
    pub fn parse_files(paths: &[PathBuf]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        for path in paths {
            match Self::parse_file(path) {
                Ok(parsed) => outcome.files.push(parsed),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    outcome.failures.push(e);
                }
            }
        }

        debug!(
            "Parsing complete: {} succeeded, {} failed",
            outcome.files.len(),
            outcome.failures.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_documented_items() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            &temp_dir,
            "views.rs",
            r#"
            /// Books
            /// ---
            /// tags:
            /// - library
            pub struct BookViewSet;

            impl BookViewSet {
                /// List books
                pub fn list(&self) {}
            }
            "#,
        );

        let parsed = AstParser::parse_file(&path).unwrap();

        assert_eq!(parsed.path, path);
        assert_eq!(parsed.syntax_tree.items.len(), 2);
    }

    #[test]
    fn test_parse_invalid_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(&temp_dir, "broken.rs", "pub fn broken( {");

        match AstParser::parse_file(&path) {
            Err(Error::ParseError { file, .. }) => assert_eq!(file, path),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_file() {
        let result = AstParser::parse_file(Path::new("/nonexistent/views.rs"));
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_parse_files_keeps_going() {
        let temp_dir = TempDir::new().unwrap();
        let good = write(&temp_dir, "good.rs", "pub fn ping() {}");
        let bad = write(&temp_dir, "bad.rs", "struct Missing }");
        let empty = write(&temp_dir, "empty.rs", "");

        let outcome = AstParser::parse_files(&[good.clone(), bad, empty.clone()]);

        let parsed: Vec<&PathBuf> = outcome.files.iter().map(|f| &f.path).collect();
        assert_eq!(parsed, vec![&good, &empty]);
        assert_eq!(outcome.failures.len(), 1);
    }
}
