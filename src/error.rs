use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Extension error: {0}")]
    ExtensionError(String),

    #[error("IO error at {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Manifest error: {0}")]
    ManifestError(String),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Category of a recoverable problem hit while assembling the object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Signature or source location could not be read from a live object
    Introspection,
    /// The host reported an object type this extension does not map
    UnknownType,
    /// No owning module record for a function, class or exception
    MissingParent,
    /// Documented parameters do not line up with the introspected ones
    ParameterMismatch,
    /// A dotted name has no second-level toc entry to hang under
    MissingTocParent,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::Introspection => write!(f, "introspection"),
            WarningKind::UnknownType => write!(f, "unknown-type"),
            WarningKind::MissingParent => write!(f, "missing-parent"),
            WarningKind::ParameterMismatch => write!(f, "parameter-mismatch"),
            WarningKind::MissingTocParent => write!(f, "missing-toc-parent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildWarning {
    pub kind: WarningKind,
    /// Symbol (or output file name) the warning is about
    pub subject: String,
    pub message: String,
}

impl BuildWarning {
    pub fn new(kind: WarningKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn introspection(subject: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            WarningKind::Introspection,
            subject,
            format!("Can't inspect {}: {}", subject, detail),
        )
    }

    pub fn unknown_type(subject: &str, what: &str) -> Self {
        Self::new(
            WarningKind::UnknownType,
            subject,
            format!("Unknown Type: {}", what),
        )
    }

    pub fn missing_parent(subject: &str, module: &str) -> Self {
        Self::new(
            WarningKind::MissingParent,
            subject,
            format!("No module record '{}' to attach {} to", module, subject),
        )
    }

    pub fn parameter_mismatch(subject: &str) -> Self {
        Self::new(
            WarningKind::ParameterMismatch,
            subject,
            format!("Documented params don't match size of params: {}", subject),
        )
    }

    pub fn missing_toc_parent(subject: &str, second_level: &str) -> Self {
        Self::new(
            WarningKind::MissingTocParent,
            subject,
            format!("No second level module found: {}", second_level),
        )
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let warning = BuildWarning::parameter_mismatch("pkg.mod.func");
        assert_eq!(
            warning.to_string(),
            "[parameter-mismatch] Documented params don't match size of params: pkg.mod.func"
        );
    }

    #[test]
    fn test_io_error_message_names_path() {
        let err = BuildError::io(
            "/tmp/out/api",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/out/api"));
    }
}
