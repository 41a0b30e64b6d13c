use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    ManifestError { file: PathBuf, message: String },
    DocumentationError(String),
    InvalidTypeExpression { expression: String, message: String },
    InvalidArgument(String),
    ConventionNotDetected,
    SerializationError(String),
    /// A `TypeNode` tagged Object or Enum lost its class reference. This is a resolver
    /// bug, never bad input, so it aborts the run.
    MissingClassReference { type_name: String },
    NameCollision { name: String, first: String, second: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::ManifestError { file, message } => {
                write!(f, "Manifest error in {}: {}", file.display(), message)
            }
            Error::DocumentationError(msg) => write!(f, "Documentation error: {}", msg),
            Error::InvalidTypeExpression { expression, message } => {
                write!(f, "Invalid type expression '{}': {}", expression, message)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::ConventionNotDetected => {
                write!(f, "No supported controller convention detected")
            }
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::MissingClassReference { type_name } => write!(
                f,
                "Type node for '{}' is tagged Object/Enum but has no class reference",
                type_name
            ),
            Error::NameCollision { name, first, second } => write!(
                f,
                "Types '{}' and '{}' both normalize to '{}'",
                first, second, name
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::DocumentationError(err.to_string())
    }
}
