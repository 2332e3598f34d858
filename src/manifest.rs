//! Symbol manifests: docstring events recorded ahead of time.
//!
//! A manifest lists what a host would report through
//! `autodoc-process-docstring`, with the introspection results captured
//! alongside, so a build can be replayed without the live objects:
//!
//! ```yaml
//! symbols:
//!   - what: module
//!     name: pkg.mod
//!     source_file: /work/pkg/pkg/mod.py
//!     source_line: 1
//!     docstring: Module summary.
//!   - what: function
//!     name: pkg.mod.func
//!     signature: { args: [a, b], defaults: ["1"] }
//!     lines: ["Do it.", ":param a: first"]
//!   - what: method
//!     name: pkg.mod.Foo.run
//!     docstring: Run it.
//!     docfields:
//!       parameters: [{ id: self }, { id: mode, description: how to run }]
//! ```
//!
//! `docfields` carries structured fields captured outside the docstring and
//! replaces whatever the docstring's own field list yields.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::debug;
use serde::Deserialize;

use crate::docfx::DocFields;
use crate::error::BuildError;
use crate::extensions::{DocstringEvent, SphinxApp};
use crate::introspect::ObjectInfo;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolManifest {
    #[serde(default)]
    pub symbols: Vec<SymbolRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolRecord {
    pub what: String,
    pub name: String,
    /// Docstring as lines; takes precedence over `docstring`
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub docfields: Option<DocFields>,
    #[serde(flatten)]
    pub object: ObjectInfo,
}

impl SymbolRecord {
    pub fn docstring_lines(&self) -> Vec<String> {
        if !self.lines.is_empty() {
            return self.lines.clone();
        }
        self.docstring
            .as_deref()
            .map(|text| text.lines().map(|l| l.to_string()).collect())
            .unwrap_or_default()
    }
}

/// Load a manifest, choosing the format from the file extension.
pub fn load(path: &Path) -> Result<SymbolManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    let manifest = match extension {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON manifest: {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML manifest: {}", path.display()))?,
        other => bail!(
            "Unsupported manifest format '{}' for {}; expected .json, .yaml or .yml",
            other,
            path.display()
        ),
    };

    Ok(manifest)
}

/// Feed every manifest symbol through the app's docstring event.
pub fn replay(app: &mut SphinxApp, manifest: &SymbolManifest) -> Result<usize, BuildError> {
    for record in &manifest.symbols {
        let lines = record.docstring_lines();
        debug!("Replaying {} {}", record.what, record.name);
        app.emit_process_docstring(&DocstringEvent {
            what: &record.what,
            name: &record.name,
            obj: &record.object,
            lines: &lines,
            docfields: record.docfields.as_ref(),
        })?;
    }
    Ok(manifest.symbols.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::docfx;
    use crate::introspect::Introspect;
    use crate::repo::RepoInfo;
    use serde_yaml::Value;
    use std::fs;
    use tempfile::TempDir;

    const YAML_MANIFEST: &str = r#"
symbols:
  - what: module
    name: pkg.mod
    source_file: /work/pkg/pkg/mod.py
    source_line: 1
    docstring: |
      Module summary.

      More detail.
  - what: function
    name: pkg.mod.func
    kind: function
    signature:
      args: [a, b]
      defaults: ["1"]
    lines: ["Do it."]
"#;

    #[test]
    fn test_load_yaml_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("symbols.yaml");
        fs::write(&path, YAML_MANIFEST).unwrap();

        let manifest = load(&path).unwrap();
        assert_eq!(manifest.symbols.len(), 2);

        let module = &manifest.symbols[0];
        assert_eq!(module.docstring_lines()[0], "Module summary.");
        assert_eq!(module.object.source_location().unwrap().line, 1);

        let func = &manifest.symbols[1];
        let spec = func.object.signature().unwrap();
        assert_eq!(spec.args, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(spec.default_for(1), Some("1"));
        assert_eq!(func.docstring_lines(), vec!["Do it.".to_string()]);
    }

    #[test]
    fn test_load_json_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("symbols.json");
        fs::write(
            &path,
            r#"{"symbols": [{"what": "class", "name": "pkg.Foo", "bases": [{"module": "builtins", "name": "object"}]}]}"#,
        )
        .unwrap();

        let manifest = load(&path).unwrap();
        let bases = manifest.symbols[0].object.bases().unwrap();
        assert_eq!(bases[0].full_name(), "builtins.object");
    }

    const REPLAY_MANIFEST: &str = r#"
symbols:
  - what: module
    name: pkg.mod
    source_file: /work/pkg/pkg/mod.py
    source_line: 1
    docstring: Errors and friends.
  - what: exception
    name: pkg.mod.Err
    source_file: /work/pkg/pkg/mod.py
    source_line: 4
    bases:
      - module: builtins
        name: Exception
        bases:
          - { module: builtins, name: BaseException }
    docstring: Something failed.
  - what: attribute
    name: pkg.mod.Err.code
    source_file: /work/pkg/pkg/mod.py
    source_line: 6
  - what: method
    name: pkg.mod.Err.describe
    source_file: /work/pkg/pkg/mod.py
    source_line: 8
    signature: { args: [self, verbose], defaults: ["False"] }
    lines: ["Describe the error.", ":param verbose: ignored here"]
    docfields:
      parameters:
        - { id: self }
        - { id: verbose, description: include the traceback, type: [bool] }
"#;

    fn read_yaml(path: &Path) -> Value {
        serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn item<'a>(doc: &'a Value, uid: &str) -> &'a Value {
        doc["items"]
            .as_sequence()
            .unwrap()
            .iter()
            .find(|item| item["uid"].as_str() == Some(uid))
            .unwrap()
    }

    #[test]
    fn test_replay_manifest_through_app() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("symbols.yml");
        fs::write(&path, REPLAY_MANIFEST).unwrap();
        let manifest = load(&path).unwrap();

        let srcdir = temp_dir.path().to_path_buf();
        let outdir = temp_dir.path().join("_build");
        let mut app = SphinxApp::new(BuildConfig::default(), srcdir, outdir);
        docfx::setup_with_repo(&mut app, RepoInfo::default()).unwrap();
        app.emit_builder_inited().unwrap();

        assert_eq!(replay(&mut app, &manifest).unwrap(), 4);
        let stats = app.emit_build_finished(None).unwrap();
        assert!(stats.warnings.is_empty());
        assert_eq!(stats.symbols_processed, 4);

        let api = temp_dir.path().join("_build/api");
        let module_doc = read_yaml(&api.join("pkg.mod.yml"));
        let module = item(&module_doc, "pkg.mod");
        assert_eq!(module["children"][0].as_str(), Some("pkg.mod.Err"));

        let class_doc = read_yaml(&api.join("pkg.mod.Err.yml"));
        let err = item(&class_doc, "pkg.mod.Err");
        let children: Vec<&str> = err["children"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|c| c.as_str())
            .collect();
        assert_eq!(children, vec!["pkg.mod.Err.code", "pkg.mod.Err.describe"]);
        assert_eq!(err["inheritance"][0][0].as_str(), Some("builtins.Exception"));
        assert_eq!(
            err["inheritance"][0][1][0].as_str(),
            Some("builtins.BaseException")
        );

        // Captured fields win over the docstring's own field list
        let describe = item(&class_doc, "pkg.mod.Err.describe");
        let params = describe["syntax"]["parameters"].as_sequence().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1]["description"].as_str(), Some("include the traceback"));
        assert_eq!(params[1]["defaultValue"].as_str(), Some("False"));
        assert_eq!(params[1]["type"][0].as_str(), Some("bool"));
        assert_eq!(describe["summary"].as_str(), Some("Describe the error."));

        let toc = read_yaml(&api.join("toc.yml"));
        let entry = &toc.as_sequence().unwrap()[0];
        assert_eq!(entry["name"].as_str(), Some("pkg.mod"));
        assert_eq!(entry["items"][0]["name"].as_str(), Some("pkg.mod.Err"));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("symbols.txt");
        fs::write(&path, "").unwrap();
        assert!(load(&path).is_err());
    }
}
