//! Output: emitted TypeScript modules on disk, and dumps of the assembly model.

use crate::model::AssemblyNode;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of emitted modules.
pub const MODULE_EXTENSION: &str = "ts";

/// Serializes the assembly model to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(assembly: &AssemblyNode) -> Result<String> {
    debug!("Serializing assembly model to YAML");
    serde_yaml::to_string(assembly).context("Failed to serialize assembly model to YAML")
}

/// Serializes the assembly model to JSON with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(assembly: &AssemblyNode) -> Result<String> {
    debug!("Serializing assembly model to JSON");
    serde_json::to_string_pretty(assembly).context("Failed to serialize assembly model to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and any missing parent directories, or overwrites an existing file.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Writes emitted modules under `output_dir`.
///
/// Module keys are relative paths without extension, so `ko/views` lands in
/// `<output_dir>/ko/views.ts`.
///
/// # Returns
///
/// The written file paths, in module order.
pub fn write_modules(
    modules: &IndexMap<String, String>,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(modules.len());
    for (name, content) in modules {
        let path = output_dir.join(format!("{}.{}", name, MODULE_EXTENSION));
        write_to_file(content, &path)?;
        written.push(path);
    }
    Ok(written)
}
