//! Final merge and output.
//!
//! Runs once at `build-finished`: folds captured docstring fields into the
//! introspected records, gathers references per file, and writes one YAML
//! file per module and class plus `toc.yml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};

use super::model::{DocFields, Item, Parameter, Syntax, TocEntry, YamlDocument};
use super::session::BuildSession;
use crate::error::{BuildError, BuildWarning};

pub const YAML_MIME_HEADER: &str = "#YamlMime:PythonReference";
pub const TOC_FILE: &str = "toc.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMerge {
    pub parameters: Vec<Parameter>,
    /// More than one introspected parameter has no documented counterpart
    pub mismatched: bool,
}

/// Align documented parameters with introspected ones by position.
///
/// One surplus introspected parameter is taken to be an undocumented
/// implicit first argument (`self`, `cls`) and passed through untouched.
pub fn merge_parameters(args: &[Parameter], docs: &[Parameter]) -> ParameterMerge {
    if docs.is_empty() {
        return ParameterMerge {
            parameters: args.to_vec(),
            mismatched: false,
        };
    }
    if args.is_empty() {
        return ParameterMerge {
            parameters: docs.to_vec(),
            mismatched: false,
        };
    }

    let mismatched = args.len() > docs.len() + 1;
    let mut merged = Vec::with_capacity(args.len());
    let mut rest = args;
    if args.len() == docs.len() + 1 {
        merged.push(args[0].clone());
        rest = &args[1..];
    }

    for (arg, doc) in rest.iter().zip(docs) {
        let mut param = arg.clone();
        param.update(doc);
        merged.push(param);
    }

    ParameterMerge {
        parameters: merged,
        mismatched,
    }
}

/// Fold captured docstring fields into an item. Returns `true` when the
/// parameter counts could not be reconciled.
pub fn merge_docfields(item: &mut Item, fields: &DocFields) -> bool {
    let syntax = item.syntax.get_or_insert_with(Syntax::default);

    let merge = merge_parameters(&syntax.parameters, &fields.parameters);
    syntax.parameters = merge.parameters;

    if fields.returns.is_some() {
        syntax.returns = fields.returns.clone();
    }
    if !fields.exceptions.is_empty() {
        syntax.exceptions = fields.exceptions.clone();
    }

    if let Some(summary) = fields.summary.as_ref().filter(|s| !s.is_empty()) {
        item.summary = Some(summary.clone());
    }

    merge.mismatched
}

/// Write every accumulated module and class file, then the toc.
pub(crate) fn emit(session: &mut BuildSession) -> Result<Vec<PathBuf>, BuildError> {
    let output_dir = session.settings.output_dir();
    fs::create_dir_all(&output_dir).map_err(|e| BuildError::io(&output_dir, e))?;

    let class_heads = collect_class_heads(&session.classes);
    let mut toc: IndexMap<String, TocEntry> = IndexMap::new();
    let mut files_written = Vec::new();

    let modules = std::mem::take(&mut session.modules);
    let classes = std::mem::take(&mut session.classes);

    for (is_module_set, data_set) in [(true, modules), (false, classes)] {
        for (filename, mut items) in data_set {
            if filename.is_empty() {
                continue;
            }

            if is_module_set {
                let heads = module_class_heads(&items, &class_heads);
                items.extend(heads);
            }

            let mut references = Vec::new();
            for item in items.iter_mut() {
                if let Some(fields) = session.module_data.get(&item.uid) {
                    if merge_docfields(item, fields) {
                        let warning = BuildWarning::parameter_mismatch(&item.uid);
                        warn!("{}", warning);
                        session.warnings.push(warning);
                    }
                }
                if let Some(item_references) = item.references.take() {
                    references.extend(item_references);
                }
            }

            let out_file = output_dir.join(format!("{}.yml", filename));
            if session.settings.verbosity >= 1 {
                info!("[docfx_yaml] Outputting {}", filename);
            } else {
                debug!("[docfx_yaml] Outputting {}", filename);
            }
            write_document(
                &out_file,
                &YamlDocument {
                    items,
                    references,
                    api_name: Vec::new(),
                },
            )?;
            files_written.push(out_file);

            add_toc_entry(&mut toc, &filename, &mut session.warnings);
        }
    }

    let toc_file = output_dir.join(TOC_FILE);
    let entries: Vec<&TocEntry> = toc.values().collect();
    let yaml = serde_yaml::to_string(&entries)?;
    fs::write(&toc_file, yaml).map_err(|e| BuildError::io(&toc_file, e))?;
    files_written.push(toc_file);

    Ok(files_written)
}

fn write_document(path: &Path, document: &YamlDocument) -> Result<(), BuildError> {
    let body = serde_yaml::to_string(document)?;
    let content = format!("{}\n{}", YAML_MIME_HEADER, body);
    fs::write(path, content).map_err(|e| BuildError::io(path, e))
}

/// First class-like record of every class, keyed by class name.
fn collect_class_heads(classes: &BTreeMap<String, Vec<Item>>) -> BTreeMap<String, Item> {
    classes
        .iter()
        .filter_map(|(name, records)| {
            records
                .iter()
                .find(|r| r.object_type.is_class_like())
                .map(|head| (name.clone(), head.clone()))
        })
        .collect()
}

/// Class head records for the class-like children of a module file.
fn module_class_heads(items: &[Item], class_heads: &BTreeMap<String, Item>) -> Vec<Item> {
    let mut heads = Vec::new();
    for item in items {
        for child in item.children.iter().flatten() {
            if let Some(head) = class_heads.get(child) {
                if !items.iter().any(|i| &i.uid == child)
                    && !heads.iter().any(|h: &Item| &h.uid == child)
                {
                    heads.push(head.clone());
                }
            }
        }
    }
    heads
}

/// File names with more than one dot hang under the entry for their first two
/// segments; everything else is a top-level entry.
fn add_toc_entry(
    toc: &mut IndexMap<String, TocEntry>,
    filename: &str,
    warnings: &mut Vec<BuildWarning>,
) {
    if filename.matches('.').count() > 1 {
        let second_level = filename.split('.').take(2).collect::<Vec<_>>().join(".");
        match toc.get_mut(&second_level) {
            Some(parent) => parent
                .items
                .get_or_insert_with(Vec::new)
                .push(TocEntry::new(filename)),
            None => {
                let warning = BuildWarning::missing_toc_parent(filename, &second_level);
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    } else {
        toc.insert(filename.to_string(), TocEntry::new(filename));
    }
}
