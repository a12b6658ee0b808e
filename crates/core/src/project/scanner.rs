use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use symgraph_api::{ApiError, ApiResult, FileSource, SourceFile};

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "py", "rs", "go", "java", "rb", "cs", "php",
];

/// Per-project ignore file, read in addition to `.gitignore`.
pub const IGNORE_FILE_NAME: &str = ".symgraphignore";

/// Walks a project root honoring ignore files and yields source files in
/// a stable order.
#[derive(Debug, Clone)]
pub struct ProjectScanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl ProjectScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the extension filter. Leading dots are ignored.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_relevant(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    pub(crate) fn collect_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkBuilder::new(&self.root)
            .require_git(false)
            .add_custom_ignore_filename(IGNORE_FILE_NAME)
            .build()
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let path = entry.path();
                if path.is_file() && self.is_relevant(path) {
                    return Some(path.to_path_buf());
                }
                None
            })
            .collect();
        paths.sort();
        paths
    }
}

impl FileSource for ProjectScanner {
    fn files(&self) -> ApiResult<Vec<SourceFile>> {
        if !self.root.is_dir() {
            return Err(ApiError::NotFound(format!(
                "project root {}",
                self.root.display()
            )));
        }
        Ok(self.collect_paths().into_iter().map(SourceFile::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/b.ts"), "").unwrap();
        fs::write(dir.path().join("src/a.ts"), "").unwrap();
        fs::write(dir.path().join("src/nested/c.py"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();

        let files = ProjectScanner::new(dir.path()).files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("src/a.ts"),
                PathBuf::from("src/b.ts"),
                PathBuf::from("src/nested/c.py"),
            ]
        );
    }

    #[test]
    fn test_ignore_files_are_honored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/out.js"), "").unwrap();
        fs::write(dir.path().join("gen.ts"), "").unwrap();
        fs::write(dir.path().join("app.ts"), "").unwrap();
        fs::write(dir.path().join(".gitignore"), "dist/\n").unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "gen.ts\n").unwrap();

        let files = ProjectScanner::new(dir.path()).files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, dir.path().join("app.ts"));
    }

    #[test]
    fn test_custom_extensions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("b.go"), "").unwrap();

        let files = ProjectScanner::new(dir.path())
            .with_extensions([".go"])
            .files()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].extension, "go");
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempdir().unwrap();
        let err = ProjectScanner::new(dir.path().join("missing"))
            .files()
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
