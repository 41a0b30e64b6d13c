use crate::metadata::{TypeCatalog, TypeDefinition};
use anyhow::{bail, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Parser for type manifests.
///
/// A manifest is a JSON or YAML document describing the application types exported by
/// one assembly: controllers with their methods, and the classes and enums they use.
///
/// ```yaml
/// assembly: MyApp
/// types:
///   - name: MyApp.Controllers.UsersController
///     base_type: Microsoft.AspNetCore.Mvc.ControllerBase
///     annotations:
///       - annotation: Route
///         template: api/[controller]
///     methods:
///       - name: Get
///         return_type: List<MyApp.Views.UserView>
///         annotations:
///           - annotation: HttpGet
/// ```
///
/// # Example
///
/// ```no_run
/// use cs_ts_service::parser::ManifestParser;
/// use std::path::Path;
///
/// let parsed = ManifestParser::parse_file(Path::new("metadata/api.json")).unwrap();
/// println!("Parsed {} types", parsed.manifest.types.len());
/// ```
pub struct ManifestParser;

/// On-disk manifest layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Name of the assembly the types were exported from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
}

/// A successfully parsed manifest with its path.
#[derive(Debug)]
pub struct ParsedManifest {
    pub path: PathBuf,
    pub manifest: Manifest,
}

impl ManifestParser {
    /// Parses a single manifest file.
    ///
    /// The format is chosen by extension: `.json` is read as JSON, `.yaml` and `.yml`
    /// as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The extension is not a manifest extension
    /// - The content is not a valid manifest (including malformed type expressions)
    pub fn parse_file(path: &Path) -> Result<ParsedManifest> {
        debug!("Parsing manifest: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let manifest = match extension.as_str() {
            "json" => Self::parse_json(&content),
            "yaml" | "yml" => Self::parse_yaml(&content),
            _ => bail!("Unsupported manifest extension: {}", path.display()),
        }
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;

        debug!(
            "Parsed manifest {} with {} types",
            path.display(),
            manifest.types.len()
        );

        Ok(ParsedManifest {
            path: path.to_path_buf(),
            manifest,
        })
    }

    pub fn parse_json(content: &str) -> Result<Manifest> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn parse_yaml(content: &str) -> Result<Manifest> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parses multiple manifests, continuing even if some fail.
    ///
    /// Failures are logged as warnings and returned in place, one result per input path.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedManifest>> {
        debug!("Parsing {} manifests", paths.len());

        let results: Vec<Result<ParsedManifest>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {:#}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }

    /// Merges parsed manifests into one catalog, in manifest order.
    ///
    /// A type defined by several manifests keeps the last definition.
    pub fn build_catalog(manifests: &[ParsedManifest]) -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        for parsed in manifests {
            for definition in &parsed.manifest.types {
                if catalog.definitions().any(|d| d.name == definition.name) {
                    warn!(
                        "Type {} redefined by {}, keeping the last definition",
                        definition.name,
                        parsed.path.display()
                    );
                }
                catalog.insert(definition.clone());
            }
        }
        catalog
    }
}
