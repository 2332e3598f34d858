//! Sphinx DocFX YAML
//!
//! A documentation-build extension that turns the docstrings a host builder
//! reports into DocFX `PythonReference` YAML files plus a `toc.yml`.

pub mod config;
pub mod docfx;
pub mod error;
pub mod extensions;
pub mod introspect;
pub mod manifest;
pub mod repo;

pub use config::BuildConfig;
pub use docfx::{setup, BuildSession, DocfxSettings, DocfxYamlExtension};
pub use error::{BuildError, BuildWarning, WarningKind};
pub use extensions::{
    BuildEnvironment, BuildStats, DocstringEvent, ExtensionLoader, ExtensionReport, SphinxApp,
    SphinxExtension,
};
pub use introspect::{ArgSpec, ClassInfo, Introspect, IntrospectError, ObjectInfo, SourceLocation};
pub use manifest::{SymbolManifest, SymbolRecord};
pub use repo::RepoInfo;
