//! Build session: all state accumulated between `builder-inited` and
//! `build-finished`.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use log::{debug, warn};

use super::docfields::{has_structured_fields, parse_docfields};
use super::emitter;
use super::linker;
use super::model::{DocFields, Item, ObjectType};
use super::record;
use crate::error::{BuildError, BuildWarning};
use crate::extensions::{normalize_path, BuildEnvironment, ExtensionReport};
use crate::introspect::Introspect;
use crate::repo::RepoInfo;

/// Config value naming the output directory, relative to the builder outdir.
pub const OUTPUT_SETTING: &str = "docfx_yaml_output";

/// Default for [`OUTPUT_SETTING`].
pub const API_ROOT: &str = "api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocfxSettings {
    /// Builder output directory
    pub outdir: PathBuf,
    /// Value of `docfx_yaml_output`
    pub output: String,
    pub verbosity: u8,
}

impl DocfxSettings {
    pub fn new(outdir: impl Into<PathBuf>, output: impl Into<String>) -> Self {
        Self {
            outdir: outdir.into(),
            output: output.into(),
            verbosity: 0,
        }
    }

    /// Read settings from the host environment.
    ///
    /// A missing or blank output setting is a fatal configuration error.
    pub fn from_env(env: &BuildEnvironment) -> Result<Self, BuildError> {
        let output = env
            .config
            .get_str(OUTPUT_SETTING)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                BuildError::ConfigError(format!(
                    "You must configure an {} setting",
                    OUTPUT_SETTING
                ))
            })?;

        Ok(Self {
            outdir: env.outdir.clone(),
            output: output.to_string(),
            verbosity: env.verbosity,
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        normalize_path(&self.outdir.join(&self.output))
    }
}

pub struct BuildSession {
    pub(crate) settings: DocfxSettings,
    pub(crate) repo: RepoInfo,
    /// Module name -> module record followed by its functions
    pub(crate) modules: BTreeMap<String, Vec<Item>>,
    /// Class name -> class record followed by its methods and attributes
    pub(crate) classes: BTreeMap<String, Vec<Item>>,
    /// Docstring fields captured per uid, merged at the end
    pub(crate) module_data: HashMap<String, DocFields>,
    pub(crate) warnings: Vec<BuildWarning>,
}

impl BuildSession {
    pub fn new(settings: DocfxSettings, repo: RepoInfo) -> Self {
        Self {
            settings,
            repo,
            modules: BTreeMap::new(),
            classes: BTreeMap::new(),
            module_data: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn settings(&self) -> &DocfxSettings {
        &self.settings
    }

    pub fn repo(&self) -> &RepoInfo {
        &self.repo
    }

    pub fn modules(&self) -> &BTreeMap<String, Vec<Item>> {
        &self.modules
    }

    pub fn classes(&self) -> &BTreeMap<String, Vec<Item>> {
        &self.classes
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    pub fn docfields(&self, uid: &str) -> Option<&DocFields> {
        self.module_data.get(uid)
    }

    /// Index one documented symbol. Returns the uid when it was recorded.
    pub fn process_docstring(
        &mut self,
        what: &str,
        name: &str,
        obj: &dyn Introspect,
        lines: &[String],
    ) -> Option<String> {
        let object_type: ObjectType = match what.parse() {
            Ok(object_type) => object_type,
            Err(_) => {
                self.push_warning(BuildWarning::unknown_type(name, what));
                return None;
            }
        };

        let Some(owner) = record::get_cls_module(object_type, name) else {
            self.push_warning(BuildWarning::unknown_type(name, what));
            return None;
        };

        let mut introspection_warnings = Vec::new();
        let item = record::create_item(
            &self.repo,
            object_type,
            name,
            &owner,
            obj,
            lines,
            &mut introspection_warnings,
        );
        for warning in introspection_warnings {
            self.push_warning(warning);
        }

        let fields = parse_docfields(lines);
        if has_structured_fields(&fields) {
            self.module_data.insert(item.uid.clone(), fields);
        }

        if object_type == ObjectType::Module
            && !insert_record(&mut self.modules, &owner.module, &item)
        {
            return None;
        }
        if object_type.is_class_like() {
            let class = owner.class.as_deref().unwrap_or(name);
            if !insert_record(&mut self.classes, class, &item) {
                return None;
            }
        }

        linker::insert_children_on_module(self, &item);
        linker::insert_children_on_class(self, &item);

        Some(item.uid)
    }

    /// Record docstring fields captured by the host for `uid`, replacing any
    /// parsed from the docstring itself.
    pub fn record_docfields(&mut self, uid: &str, fields: DocFields) {
        if fields.is_empty() {
            return;
        }
        self.module_data.insert(uid.to_string(), fields);
    }

    pub(crate) fn push_warning(&mut self, warning: BuildWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Merge, write every file and the toc, and hand back what was written.
    pub fn finish(mut self) -> Result<ExtensionReport, BuildError> {
        let files_written = emitter::emit(&mut self)?;
        Ok(ExtensionReport {
            files_written,
            warnings: self.warnings,
        })
    }
}

/// Add a module or class head record, unless the same uid is already there.
fn insert_record(collection: &mut BTreeMap<String, Vec<Item>>, key: &str, item: &Item) -> bool {
    let records = collection.entry(key.to_string()).or_default();
    if records
        .iter()
        .any(|r| r.uid == item.uid && r.object_type == item.object_type)
    {
        debug!("{} was already documented, ignoring repeat", item.uid);
        return false;
    }
    records.push(item.clone());
    true
}
