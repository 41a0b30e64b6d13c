use anyhow::{bail, Result};
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never descended into: build output of .NET projects.
const SKIPPED_DIRECTORIES: &[&str] = &["bin", "obj", "node_modules"];

/// File scanner for locating type manifests and XML documentation files.
///
/// The `FileScanner` recursively walks an input directory. Files ending in `.json`, `.yaml`
/// or `.yml` are type manifests; files ending in `.xml` are documentation files. Hidden
/// directories and the build output directories (`bin`, `obj`, `node_modules`) are skipped.
///
/// # Example
///
/// ```no_run
/// use cs_ts_service::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./metadata"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} manifests", result.manifest_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Type manifests, sorted by path
    pub manifest_files: Vec<PathBuf>,
    /// XML documentation files, sorted by path
    pub documentation_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The directory to scan. A path to a single manifest file is accepted too.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and classifies every file of interest.
    ///
    /// Inaccessible entries are logged and recorded as warnings; scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.exists() {
            bail!("Input path does not exist: {}", self.root_path.display());
        }

        let mut manifest_files = Vec::new();
        let mut documentation_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                if !e.file_type().is_dir() {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && !SKIPPED_DIRECTORIES.contains(&file_name.as_ref())
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !path.is_file() {
                        continue;
                    }
                    match FileKind::of(path) {
                        Some(FileKind::Manifest) => manifest_files.push(path.to_path_buf()),
                        Some(FileKind::Documentation) => {
                            documentation_files.push(path.to_path_buf())
                        }
                        None => {}
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        manifest_files.sort();
        documentation_files.sort();

        Ok(ScanResult {
            manifest_files,
            documentation_files,
            warnings,
        })
    }
}

/// Kind of an input file, judged by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Manifest,
    Documentation,
}

impl FileKind {
    pub fn of(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" | "yaml" | "yml" => Some(Self::Manifest),
            "xml" => Some(Self::Documentation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_classifies_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("api.json"), "{}").unwrap();
        fs::write(root.join("models.yaml"), "types: []").unwrap();
        fs::write(root.join("MyApp.xml"), "<doc/>").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(names(&result.manifest_files), vec!["api.json", "models.yaml"]);
        assert_eq!(names(&result.documentation_files), vec!["MyApp.xml"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileScanner::new(temp_dir.path().to_path_buf()).scan().unwrap();

        assert!(result.manifest_files.is_empty());
        assert!(result.documentation_files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("api/v1")).unwrap();
        fs::write(root.join("api/users.json"), "{}").unwrap();
        fs::write(root.join("api/v1/orders.yml"), "types: []").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(result.manifest_files.len(), 2);
    }

    #[test]
    fn test_scan_skips_build_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for dir in ["bin", "obj", ".vs"] {
            fs::create_dir(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("stale.json"), "{}").unwrap();
        }
        fs::write(root.join("api.json"), "{}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(names(&result.manifest_files), vec!["api.json"]);
    }

    #[test]
    fn test_scan_single_file_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("api.json");
        fs::write(&file, "{}").unwrap();

        let result = FileScanner::new(file.clone()).scan().unwrap();
        assert_eq!(result.manifest_files, vec![file]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(FileScanner::new(missing).scan().is_err());
    }
}
