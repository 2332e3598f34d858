//! Turns one introspected symbol into an [`Item`].
//!
//! Introspection is best effort: a signature or source location the host
//! cannot provide leaves the field empty and records a warning.

use std::path::{Component, Path};

use log::debug;

use super::model::{InheritanceNode, Item, ObjectType, Parameter, Remote, Source, Syntax};
use super::transform;
use crate::error::BuildWarning;
use crate::introspect::{ClassInfo, Introspect};
use crate::repo::RepoInfo;

/// Where a symbol lives: its owning class (if any) and its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub class: Option<String>,
    pub module: String,
}

/// Derive the owning class and module from a dotted name.
///
/// Returns `None` when the symbol has no module, as for a bare top-level
/// function name.
pub fn get_cls_module(object_type: ObjectType, name: &str) -> Option<Owner> {
    let (class, module) = match object_type {
        ObjectType::Function => (None, parent_name(name, 1)),
        ObjectType::Exception | ObjectType::Class => (Some(name.to_string()), parent_name(name, 1)),
        ObjectType::Method | ObjectType::Attribute => {
            (Some(parent_name(name, 1)), parent_name(name, 2))
        }
        ObjectType::Module => (None, name.to_string()),
    };

    if module.is_empty() {
        return None;
    }
    Some(Owner { class, module })
}

fn parent_name(name: &str, levels: usize) -> String {
    let segments: Vec<&str> = name.split('.').collect();
    let keep = segments.len().saturating_sub(levels);
    segments[..keep].join(".")
}

pub fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Build the record for one symbol.
pub fn create_item(
    repo: &RepoInfo,
    object_type: ObjectType,
    name: &str,
    owner: &Owner,
    obj: &dyn Introspect,
    lines: &[String],
    warnings: &mut Vec<BuildWarning>,
) -> Item {
    let short = short_name(name).to_string();

    let mut parameters = Vec::new();
    if object_type.is_callable() {
        match obj.signature() {
            Ok(spec) => {
                for (index, arg) in spec.args.iter().enumerate() {
                    let mut param = Parameter::new(arg.as_str());
                    if let Some(default) = spec.default_for(index) {
                        param.default_value = Some(default.to_string());
                    }
                    parameters.push(param);
                }
            }
            Err(e) => {
                debug!("Can't get argspec for {}: {}", obj.kind(), name);
                warnings.push(BuildWarning::introspection(name, e));
            }
        }
    }

    let (path, start_line) = match obj.source_location() {
        Ok(location) => (
            Some(relative_source_path(&location.file, repo.root.as_deref())),
            Some(location.line),
        ),
        Err(e) => {
            debug!("Can't inspect type {}: {}", obj.kind(), name);
            warnings.push(BuildWarning::introspection(name, e));
            (None, None)
        }
    };

    let inheritance = if object_type.is_class_like() {
        obj.bases().map(collect_inheritance)
    } else {
        None
    };

    let (children, references) = if object_type.is_container() {
        (Some(Vec::new()), Some(Vec::new()))
    } else {
        (None, None)
    };

    Item {
        uid: name.to_string(),
        name: short.clone(),
        full_name: name.to_string(),
        docfx_type: object_type.docfx_type(),
        object_type,
        module: owner.module.clone(),
        class: owner.class.clone(),
        summary: transform::transform_lines(lines),
        syntax: if parameters.is_empty() {
            None
        } else {
            Some(Syntax {
                parameters,
                ..Default::default()
            })
        },
        source: Source {
            remote: Remote {
                path: path.clone(),
                branch: repo.branch.clone(),
                repo: repo.remote.clone(),
            },
            id: short,
            path,
            start_line,
        },
        langs: vec!["python".to_string()],
        inheritance,
        children,
        references,
    }
}

/// One node per direct base, each nesting its own bases depth-first.
pub fn collect_inheritance(bases: &[ClassInfo]) -> Vec<InheritanceNode> {
    bases
        .iter()
        .map(|base| InheritanceNode {
            uid: base.full_name(),
            bases: collect_inheritance(&base.bases),
        })
        .collect()
}

/// Express a source file relative to the repository, or to the installed
/// package root when it lives outside the checkout.
pub fn relative_source_path(file: &Path, repo_root: Option<&Path>) -> String {
    if let Some(relative) = repo_root.and_then(|root| file.strip_prefix(root).ok()) {
        return to_slash(relative);
    }

    let components: Vec<Component> = file.components().collect();
    if let Some(pos) = components.iter().rposition(|c| {
        matches!(c, Component::Normal(n) if *n == "site-packages" || *n == "dist-packages")
    }) {
        let rest: std::path::PathBuf = components[pos + 1..].iter().collect();
        return to_slash(&rest);
    }

    let relative: std::path::PathBuf = components
        .iter()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    to_slash(&relative)
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::ObjectInfo;
    use std::path::PathBuf;

    fn repo() -> RepoInfo {
        RepoInfo {
            remote: Some("https://github.com/example/pkg.git".to_string()),
            branch: Some("main".to_string()),
            root: Some(PathBuf::from("/work/pkg")),
        }
    }

    #[test]
    fn test_get_cls_module() {
        assert_eq!(
            get_cls_module(ObjectType::Method, "pkg.mod.Foo.bar"),
            Some(Owner {
                class: Some("pkg.mod.Foo".to_string()),
                module: "pkg.mod".to_string()
            })
        );
        assert_eq!(
            get_cls_module(ObjectType::Class, "pkg.mod.Foo"),
            Some(Owner {
                class: Some("pkg.mod.Foo".to_string()),
                module: "pkg.mod".to_string()
            })
        );
        assert_eq!(
            get_cls_module(ObjectType::Function, "pkg.mod.func").map(|o| o.module),
            Some("pkg.mod".to_string())
        );
        assert_eq!(
            get_cls_module(ObjectType::Module, "pkg.mod").map(|o| o.module),
            Some("pkg.mod".to_string())
        );
        assert_eq!(get_cls_module(ObjectType::Function, "func"), None);
    }

    #[test]
    fn test_function_parameters_with_defaults() {
        let obj = ObjectInfo::new("function")
            .with_signature(&["a", "b"], &["1"])
            .with_source("/work/pkg/pkg/mod.py", 10);
        let owner = get_cls_module(ObjectType::Function, "pkg.mod.func").unwrap();
        let mut warnings = Vec::new();
        let item = create_item(
            &repo(),
            ObjectType::Function,
            "pkg.mod.func",
            &owner,
            &obj,
            &[],
            &mut warnings,
        );

        assert!(warnings.is_empty());
        assert_eq!(
            item.parameters(),
            &[Parameter::new("a"), Parameter::new("b").with_default("1")]
        );
        assert_eq!(item.source.path.as_deref(), Some("pkg/mod.py"));
        assert_eq!(item.source.start_line, Some(10));
        assert_eq!(item.source.remote.branch.as_deref(), Some("main"));
        assert_eq!(item.name, "func");
        assert!(item.children.is_none());
    }

    #[test]
    fn test_introspection_failure_degrades() {
        let obj = ObjectInfo::new("builtin_function_or_method");
        let owner = get_cls_module(ObjectType::Function, "pkg.mod.func").unwrap();
        let mut warnings = Vec::new();
        let item = create_item(
            &repo(),
            ObjectType::Function,
            "pkg.mod.func",
            &owner,
            &obj,
            &["Summary.".to_string()],
            &mut warnings,
        );

        assert_eq!(warnings.len(), 2);
        assert!(item.syntax.is_none());
        assert!(item.source.path.is_none());
        assert!(item.source.start_line.is_none());
        assert_eq!(item.summary.as_deref(), Some("Summary."));
    }

    #[test]
    fn test_class_inheritance_chain() {
        let object = ClassInfo::new("builtins", "object");
        let base = ClassInfo::new("pkg.base", "Base").with_bases(vec![object.clone()]);
        let obj = ObjectInfo::new("type")
            .with_source("/work/pkg/pkg/mod.py", 3)
            .with_bases(vec![base]);
        let owner = get_cls_module(ObjectType::Class, "pkg.mod.Foo").unwrap();
        let mut warnings = Vec::new();
        let item = create_item(
            &repo(),
            ObjectType::Class,
            "pkg.mod.Foo",
            &owner,
            &obj,
            &[],
            &mut warnings,
        );

        let inheritance = item.inheritance.unwrap();
        assert_eq!(inheritance.len(), 1);
        assert_eq!(inheritance[0].uid, "pkg.base.Base");
        assert_eq!(inheritance[0].bases[0].uid, "builtins.object");
        assert_eq!(inheritance[0].depth(), 2);
        assert_eq!(item.children, Some(Vec::new()));
    }

    #[test]
    fn test_relative_source_path() {
        let root = Path::new("/work/pkg");
        assert_eq!(
            relative_source_path(Path::new("/work/pkg/pkg/mod.py"), Some(root)),
            "pkg/mod.py"
        );
        assert_eq!(
            relative_source_path(
                Path::new("/usr/lib/python3/site-packages/requests/api.py"),
                Some(root)
            ),
            "requests/api.py"
        );
        assert_eq!(
            relative_source_path(Path::new("/opt/other/mod.py"), None),
            "opt/other/mod.py"
        );
    }
}
