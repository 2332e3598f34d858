//! DocFX YAML object model.
//!
//! Field names and nesting follow the `PythonReference` YAML schema, so these
//! types serialize straight into the output files.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// Object type tag as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Module,
    Class,
    Exception,
    Method,
    Function,
    Attribute,
}

impl ObjectType {
    /// DocFX has no exception or attribute kinds; they map onto the nearest.
    pub fn docfx_type(&self) -> DocfxType {
        match self {
            ObjectType::Method | ObjectType::Function => DocfxType::Method,
            ObjectType::Module => DocfxType::Namespace,
            ObjectType::Class | ObjectType::Exception => DocfxType::Class,
            ObjectType::Attribute => DocfxType::Property,
        }
    }

    /// Types that own a class file and collect member children.
    pub fn is_class_like(&self) -> bool {
        matches!(self, ObjectType::Class | ObjectType::Exception)
    }

    /// Types whose records carry `children` and `references`.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ObjectType::Module | ObjectType::Class | ObjectType::Exception
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Method | ObjectType::Function)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Module => "module",
            ObjectType::Class => "class",
            ObjectType::Exception => "exception",
            ObjectType::Method => "method",
            ObjectType::Function => "function",
            ObjectType::Attribute => "attribute",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" => Ok(ObjectType::Module),
            "class" => Ok(ObjectType::Class),
            "exception" => Ok(ObjectType::Exception),
            "method" => Ok(ObjectType::Method),
            "function" => Ok(ObjectType::Function),
            "attribute" => Ok(ObjectType::Attribute),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocfxType {
    Namespace,
    Class,
    Method,
    Property,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl Parameter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Overlay the fields `doc` carries onto this parameter.
    pub fn update(&mut self, doc: &Parameter) {
        if !doc.id.is_empty() {
            self.id = doc.id.clone();
        }
        if doc.default_value.is_some() {
            self.default_value = doc.default_value.clone();
        }
        if doc.description.is_some() {
            self.description = doc.description.clone();
        }
        if !doc.types.is_empty() {
            self.types = doc.types.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnDoc {
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDoc {
    #[serde(rename = "type")]
    pub exception_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Syntax {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "return", skip_serializing_if = "Option::is_none")]
    pub returns: Option<ReturnDoc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<ExceptionDoc>,
}

/// Fields captured from a structured docstring, keyed by symbol uid in the
/// session until the final merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "return", default)]
    pub returns: Option<ReturnDoc>,
    #[serde(default)]
    pub exceptions: Vec<ExceptionDoc>,
}

impl DocFields {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.parameters.is_empty()
            && self.returns.is_none()
            && self.exceptions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Remote {
    pub path: Option<String>,
    pub branch: Option<String>,
    pub repo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Source {
    pub remote: Remote,
    pub id: String,
    pub path: Option<String>,
    #[serde(rename = "startLine")]
    pub start_line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub uid: String,
    pub parent: String,
    #[serde(rename = "isExternal")]
    pub is_external: bool,
    pub name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
}

/// One base class and, nested, its own bases.
///
/// Serializes as `[uid, [base, ...], ...]` to mirror the chain as nested lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceNode {
    pub uid: String,
    pub bases: Vec<InheritanceNode>,
}

impl InheritanceNode {
    /// Length of the longest ancestor chain, counting this node.
    pub fn depth(&self) -> usize {
        1 + self.bases.iter().map(|b| b.depth()).max().unwrap_or(0)
    }
}

impl Serialize for InheritanceNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        enum Element<'a> {
            Uid(&'a str),
            Node(&'a InheritanceNode),
        }

        impl Serialize for Element<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    Element::Uid(uid) => serializer.serialize_str(uid),
                    Element::Node(node) => node.serialize(serializer),
                }
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.bases.len() + 1))?;
        seq.serialize_element(&Element::Uid(&self.uid))?;
        for base in &self.bases {
            seq.serialize_element(&Element::Node(base))?;
        }
        seq.end()
    }
}

/// One documented symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub uid: String,
    pub name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "type")]
    pub docfx_type: DocfxType,
    #[serde(rename = "_type")]
    pub object_type: ObjectType,
    pub module: String,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<Syntax>,
    pub source: Source,
    pub langs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inheritance: Option<Vec<InheritanceNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

impl Item {
    /// A reference entry pointing from `parent` to this item.
    pub fn reference(&self, parent: &str) -> Reference {
        Reference {
            uid: self.uid.clone(),
            parent: parent.to_string(),
            is_external: false,
            name: self.name.clone(),
            full_name: self.full_name.clone(),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        self.syntax
            .as_ref()
            .map(|s| s.parameters.as_slice())
            .unwrap_or(&[])
    }

    /// Record `child` under this item, once.
    pub fn add_child(&mut self, child: &Item) -> bool {
        let children = self.children.get_or_insert_with(Vec::new);
        if children.iter().any(|uid| uid == &child.uid) {
            return false;
        }
        children.push(child.uid.clone());
        let reference = child.reference(&self.uid);
        self.references.get_or_insert_with(Vec::new).push(reference);
        true
    }
}

/// Top-level shape of one output file.
#[derive(Debug, Clone, Serialize)]
pub struct YamlDocument {
    pub items: Vec<Item>,
    pub references: Vec<Reference>,
    pub api_name: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub name: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<TocEntry>>,
}

impl TocEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            href: format!("{}.yml", name),
            items: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_round_trip_names() {
        for name in ["module", "class", "exception", "method", "function", "attribute"] {
            let parsed: ObjectType = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
        }
        assert_eq!("data".parse::<ObjectType>(), Err("data".to_string()));
    }

    #[test]
    fn test_docfx_type_mapping() {
        assert_eq!(ObjectType::Function.docfx_type(), DocfxType::Method);
        assert_eq!(ObjectType::Module.docfx_type(), DocfxType::Namespace);
        assert_eq!(ObjectType::Exception.docfx_type(), DocfxType::Class);
        assert_eq!(ObjectType::Attribute.docfx_type(), DocfxType::Property);
    }

    #[test]
    fn test_inheritance_serializes_as_nested_lists() {
        let node = InheritanceNode {
            uid: "pkg.Base".to_string(),
            bases: vec![InheritanceNode {
                uid: "builtins.object".to_string(),
                bases: Vec::new(),
            }],
        };
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"["pkg.Base",["builtins.object"]]"#);
        assert_eq!(node.depth(), 2);
    }

    #[test]
    fn test_parameter_update_overlays_present_fields() {
        let mut arg = Parameter::new("b").with_default("1");
        let doc = Parameter {
            id: "b".to_string(),
            description: Some("the b value".to_string()),
            types: vec!["int".to_string()],
            ..Default::default()
        };
        arg.update(&doc);
        assert_eq!(arg.default_value.as_deref(), Some("1"));
        assert_eq!(arg.description.as_deref(), Some("the b value"));
        assert_eq!(arg.types, vec!["int".to_string()]);
    }

    #[test]
    fn test_parameter_serialization_skips_empty() {
        let yaml = serde_yaml::to_string(&Parameter::new("a")).unwrap();
        assert_eq!(yaml.trim(), "id: a");
    }
}
