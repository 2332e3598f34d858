//! Introspection seam between the host and the extension.
//!
//! The host owns the live objects being documented. It exposes what the
//! extension needs from them (call signature, where the source lives, base
//! classes) through [`Introspect`]. [`ObjectInfo`] is a plain-data
//! implementation used by hosts that collect this information up front,
//! such as the manifest replay in the binary.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntrospectError {
    #[error("no signature available for {0}")]
    NoSignature(String),

    #[error("no source available for {0}")]
    NoSource(String),

    #[error("{0}")]
    Other(String),
}

/// Positional argument names plus default values for the trailing arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub args: Vec<String>,
    #[serde(default)]
    pub defaults: Vec<String>,
}

impl ArgSpec {
    pub fn new(args: Vec<String>, defaults: Vec<String>) -> Self {
        Self { args, defaults }
    }

    /// Default value of the argument at `index`, if it has one.
    ///
    /// Defaults bind to the last `defaults.len()` arguments.
    pub fn default_for(&self, index: usize) -> Option<&str> {
        let first_with_default = self.args.len().checked_sub(self.defaults.len())?;
        if index < first_with_default || index >= self.args.len() {
            return None;
        }
        self.defaults
            .get(index - first_with_default)
            .map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

/// A base class as seen from the host, with its own bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub module: String,
    pub name: String,
    #[serde(default)]
    pub bases: Vec<ClassInfo>,
}

impl ClassInfo {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            bases: Vec::new(),
        }
    }

    pub fn with_bases(mut self, bases: Vec<ClassInfo>) -> Self {
        self.bases = bases;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// What the extension can ask of a live object.
pub trait Introspect {
    /// Human-readable kind of the object, used in diagnostics
    fn kind(&self) -> &str {
        "object"
    }

    fn signature(&self) -> Result<ArgSpec, IntrospectError>;

    fn source_location(&self) -> Result<SourceLocation, IntrospectError>;

    /// Direct base classes; `None` for objects that are not classes.
    fn bases(&self) -> Option<&[ClassInfo]>;
}

/// Introspection results captured ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub signature: Option<ArgSpec>,
    #[serde(default)]
    pub source_file: Option<PathBuf>,
    #[serde(default)]
    pub source_line: Option<usize>,
    #[serde(default)]
    pub bases: Option<Vec<ClassInfo>>,
}

fn default_kind() -> String {
    "object".to_string()
}

impl ObjectInfo {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_signature(mut self, args: &[&str], defaults: &[&str]) -> Self {
        self.signature = Some(ArgSpec::new(
            args.iter().map(|s| s.to_string()).collect(),
            defaults.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn with_source(mut self, file: impl Into<PathBuf>, line: usize) -> Self {
        self.source_file = Some(file.into());
        self.source_line = Some(line);
        self
    }

    pub fn with_bases(mut self, bases: Vec<ClassInfo>) -> Self {
        self.bases = Some(bases);
        self
    }
}

impl Introspect for ObjectInfo {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn signature(&self) -> Result<ArgSpec, IntrospectError> {
        self.signature
            .clone()
            .ok_or_else(|| IntrospectError::NoSignature(self.kind.clone()))
    }

    fn source_location(&self) -> Result<SourceLocation, IntrospectError> {
        match (&self.source_file, self.source_line) {
            (Some(file), Some(line)) => Ok(SourceLocation {
                file: file.clone(),
                line,
            }),
            _ => Err(IntrospectError::NoSource(self.kind.clone())),
        }
    }

    fn bases(&self) -> Option<&[ClassInfo]> {
        self.bases.as_deref()
    }
}
