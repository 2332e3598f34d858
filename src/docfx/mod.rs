//! DocFX YAML extension.
//!
//! Indexes every docstring the host reports into a [`BuildSession`] and, when
//! the build finishes, writes a `PythonReference` YAML file per module and
//! class together with a `toc.yml`.
//!
//! Register it from a conf file (`extensions = ["docfx_yaml"]`) or directly
//! with [`setup`].

pub mod docfields;
pub mod emitter;
pub mod linker;
pub mod model;
pub mod record;
pub mod session;
pub mod transform;

use log::{debug, warn};

use crate::error::BuildError;
use crate::extensions::{
    BuildEnvironment, DocstringEvent, ExtensionReport, SphinxApp, SphinxExtension,
};
use crate::repo::RepoInfo;

pub use model::{DocFields, Item, ObjectType, Parameter};
pub use session::{BuildSession, DocfxSettings, API_ROOT, OUTPUT_SETTING};

pub const EXTENSION_NAME: &str = "docfx_yaml";

#[derive(Default)]
pub struct DocfxYamlExtension {
    session: Option<BuildSession>,
    /// Repository facts to use instead of probing git at init
    repo: Option<RepoInfo>,
}

impl DocfxYamlExtension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo_info(repo: RepoInfo) -> Self {
        Self {
            session: None,
            repo: Some(repo),
        }
    }

    pub fn session(&self) -> Option<&BuildSession> {
        self.session.as_ref()
    }

    fn session_mut(&mut self) -> Result<&mut BuildSession, BuildError> {
        self.session.as_mut().ok_or_else(|| {
            BuildError::ExtensionError(format!(
                "{} received an event before builder-inited",
                EXTENSION_NAME
            ))
        })
    }
}

impl SphinxExtension for DocfxYamlExtension {
    fn name(&self) -> &str {
        EXTENSION_NAME
    }

    fn builder_inited(&mut self, env: &BuildEnvironment) -> Result<(), BuildError> {
        let settings = DocfxSettings::from_env(env)?;
        let repo = match &self.repo {
            Some(repo) => repo.clone(),
            None => RepoInfo::discover(&env.srcdir),
        };
        debug!(
            "{} writing to {}",
            EXTENSION_NAME,
            settings.output_dir().display()
        );
        self.session = Some(BuildSession::new(settings, repo));
        Ok(())
    }

    fn process_docstring(
        &mut self,
        _env: &BuildEnvironment,
        event: &DocstringEvent<'_>,
    ) -> Result<(), BuildError> {
        let session = self.session_mut()?;
        let uid = session.process_docstring(event.what, event.name, event.obj, event.lines);
        if let (Some(uid), Some(fields)) = (uid, event.docfields) {
            session.record_docfields(&uid, fields.clone());
        }
        Ok(())
    }

    fn build_finished(
        &mut self,
        _env: &BuildEnvironment,
        error: Option<&BuildError>,
    ) -> Result<ExtensionReport, BuildError> {
        if let Some(error) = error {
            warn!("Build finished with an error, writing collected output anyway: {}", error);
        }
        match self.session.take() {
            Some(session) => session.finish(),
            None => Ok(ExtensionReport::default()),
        }
    }
}

/// Register the `docfx_yaml_output` setting and the extension's handlers.
pub fn setup(app: &mut SphinxApp) -> Result<(), BuildError> {
    app.add_config_value(OUTPUT_SETTING, serde_json::Value::from(API_ROOT));
    app.add_extension(Box::new(DocfxYamlExtension::new()))
}

/// Like [`setup`], with repository facts supplied instead of probed.
pub fn setup_with_repo(app: &mut SphinxApp, repo: RepoInfo) -> Result<(), BuildError> {
    app.add_config_value(OUTPUT_SETTING, serde_json::Value::from(API_ROOT));
    app.add_extension(Box::new(DocfxYamlExtension::with_repo_info(repo)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::ObjectInfo;
    use std::path::PathBuf;

    fn env() -> BuildEnvironment {
        let mut config = crate::config::BuildConfig::default();
        config.add_config_value(OUTPUT_SETTING, serde_json::Value::from(API_ROOT));
        BuildEnvironment {
            config,
            srcdir: PathBuf::from("docs"),
            outdir: PathBuf::from("_build"),
            verbosity: 0,
        }
    }

    #[test]
    fn test_docstring_before_init_is_an_error() {
        let mut extension = DocfxYamlExtension::new();
        let obj = ObjectInfo::new("module");
        let result = extension.process_docstring(
            &env(),
            &DocstringEvent {
                what: "module",
                name: "pkg",
                obj: &obj,
                lines: &[],
                docfields: None,
            },
        );
        assert!(matches!(result, Err(BuildError::ExtensionError(_))));
    }

    #[test]
    fn test_init_creates_session() {
        let mut extension = DocfxYamlExtension::with_repo_info(RepoInfo::default());
        extension.builder_inited(&env()).unwrap();
        let session = extension.session().unwrap();
        assert_eq!(session.settings().output_dir(), PathBuf::from("_build/api"));
    }

    #[test]
    fn test_finish_without_init_writes_nothing() {
        let mut extension = DocfxYamlExtension::new();
        let report = extension.build_finished(&env(), None).unwrap();
        assert!(report.files_written.is_empty());
    }
}
