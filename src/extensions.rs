//! Host application and extension event contract.
//!
//! A [`SphinxApp`] owns the build environment and the registered extensions,
//! and drives them through three lifecycle events:
//!
//! 1. `builder-inited`, once, before any symbol is seen
//! 2. `autodoc-process-docstring`, once per documented symbol
//! 3. `build-finished`, once, after the last symbol
//!
//! Extensions are registered by a `setup` function, the same way a conf file
//! lists extension modules by name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::BuildConfig;
use crate::docfx::DocFields;
use crate::error::{BuildError, BuildWarning};
use crate::introspect::Introspect;

/// Environment shared with every extension callback.
#[derive(Debug, Clone)]
pub struct BuildEnvironment {
    pub config: BuildConfig,
    pub srcdir: PathBuf,
    pub outdir: PathBuf,
    pub verbosity: u8,
}

/// One `autodoc-process-docstring` event.
pub struct DocstringEvent<'a> {
    /// Object type tag as reported by the host (`module`, `class`, ...)
    pub what: &'a str,
    /// Fully-qualified name
    pub name: &'a str,
    pub obj: &'a dyn Introspect,
    /// Docstring lines as extracted by the host
    pub lines: &'a [String],
    /// Structured fields the host captured on its own, if any
    pub docfields: Option<&'a DocFields>,
}

/// What an extension hands back when the build finishes.
#[derive(Debug, Clone, Default)]
pub struct ExtensionReport {
    pub files_written: Vec<PathBuf>,
    pub warnings: Vec<BuildWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub symbols_processed: usize,
    pub files_written: Vec<PathBuf>,
    pub warnings: Vec<BuildWarning>,
}

pub trait SphinxExtension {
    fn name(&self) -> &str;

    fn builder_inited(&mut self, _env: &BuildEnvironment) -> Result<(), BuildError> {
        Ok(())
    }

    fn process_docstring(
        &mut self,
        _env: &BuildEnvironment,
        _event: &DocstringEvent<'_>,
    ) -> Result<(), BuildError> {
        Ok(())
    }

    fn build_finished(
        &mut self,
        _env: &BuildEnvironment,
        _error: Option<&BuildError>,
    ) -> Result<ExtensionReport, BuildError> {
        Ok(ExtensionReport::default())
    }
}

pub struct SphinxApp {
    env: BuildEnvironment,
    extensions: Vec<Box<dyn SphinxExtension>>,
    symbols_processed: usize,
}

impl SphinxApp {
    pub fn new(config: BuildConfig, srcdir: PathBuf, outdir: PathBuf) -> Self {
        Self {
            env: BuildEnvironment {
                config,
                srcdir,
                outdir,
                verbosity: 0,
            },
            extensions: Vec::new(),
            symbols_processed: 0,
        }
    }

    pub fn set_verbosity(&mut self, verbosity: u8) {
        self.env.verbosity = verbosity;
    }

    pub fn env(&self) -> &BuildEnvironment {
        &self.env
    }

    pub fn config_mut(&mut self) -> &mut BuildConfig {
        &mut self.env.config
    }

    pub fn add_config_value(&mut self, name: &str, default: serde_json::Value) {
        self.env.config.add_config_value(name, default);
    }

    pub fn add_extension(&mut self, extension: Box<dyn SphinxExtension>) -> Result<(), BuildError> {
        if self.has_extension(extension.name()) {
            return Err(BuildError::ExtensionError(format!(
                "Extension '{}' is already registered",
                extension.name()
            )));
        }
        debug!("Registered extension '{}'", extension.name());
        self.extensions.push(extension);
        Ok(())
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e.name() == name)
    }

    /// Fire `builder-inited`. Any extension failing here aborts the build.
    pub fn emit_builder_inited(&mut self) -> Result<(), BuildError> {
        for extension in self.extensions.iter_mut() {
            extension.builder_inited(&self.env)?;
        }
        Ok(())
    }

    pub fn emit_process_docstring(&mut self, event: &DocstringEvent<'_>) -> Result<(), BuildError> {
        self.symbols_processed += 1;
        for extension in self.extensions.iter_mut() {
            extension.process_docstring(&self.env, event)?;
        }
        Ok(())
    }

    /// Fire `build-finished` and gather what every extension reports.
    pub fn emit_build_finished(
        &mut self,
        error: Option<&BuildError>,
    ) -> Result<BuildStats, BuildError> {
        let mut stats = BuildStats {
            symbols_processed: self.symbols_processed,
            ..Default::default()
        };

        for extension in self.extensions.iter_mut() {
            let report = extension.build_finished(&self.env, error)?;
            stats.files_written.extend(report.files_written);
            stats.warnings.extend(report.warnings);
        }

        info!(
            "Build finished: {} symbols, {} files written, {} warnings",
            stats.symbols_processed,
            stats.files_written.len(),
            stats.warnings.len()
        );
        Ok(stats)
    }
}

type SetupFn = fn(&mut SphinxApp) -> Result<(), BuildError>;

/// Maps extension names from the configuration to their setup functions.
pub struct ExtensionLoader {
    builtins: HashMap<&'static str, SetupFn>,
}

impl Default for ExtensionLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionLoader {
    pub fn new() -> Self {
        let mut builtins: HashMap<&'static str, SetupFn> = HashMap::new();
        builtins.insert("docfx_yaml", crate::docfx::setup);
        builtins.insert("docfx_yaml.extension", crate::docfx::setup);
        Self { builtins }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    pub fn load_extension(&self, name: &str, app: &mut SphinxApp) -> Result<(), BuildError> {
        let setup = self
            .builtins
            .get(name)
            .ok_or_else(|| BuildError::ExtensionError(format!("Unknown extension '{}'", name)))?;
        setup(app)
    }

    /// Load every extension named in the configuration, skipping unknown ones.
    pub fn load_configured(&self, app: &mut SphinxApp) -> Result<usize, BuildError> {
        let names = app.env().config.extensions.clone();
        let mut loaded = 0;
        for name in &names {
            if !self.is_known(name) {
                warn!("Failed to load extension '{}': not available", name);
                continue;
            }
            self.load_extension(name, app)?;
            loaded += 1;
        }
        Ok(loaded)
    }
}

/// Normalize a path lexically, without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_parent = matches!(
                    normalized.components().next_back(),
                    Some(Component::ParentDir)
                );
                if at_parent || !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
