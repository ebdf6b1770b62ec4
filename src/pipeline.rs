//! Generation Pipeline - one run over many files
//!
//! A run owns the shared symbol registry and the runtime imports. Files are
//! created from the run, printed into by the caller, and collected back.
//! The first error aborts the whole run.

use std::fs;
use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::GeneratorSettings;
use crate::error::GenerateError;
use crate::file::{GeneratedArtifact, GeneratedFile};
use crate::hashing::GenerationManifest;
use crate::preamble::{JsDocBlock, SchemaFileInfo};
use crate::print::Printable;
use crate::registry::{EntityDescriptor, EntityRef, RuntimeImports, SymbolRegistry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub files: Vec<GeneratedArtifact>,
    pub manifest: GenerationManifest,
}

pub struct GenerationRun {
    settings: GeneratorSettings,
    registry: SymbolRegistry,
    runtime: RuntimeImports,
}

impl GenerationRun {
    pub fn new(settings: GeneratorSettings, registry: SymbolRegistry) -> Self {
        let runtime = RuntimeImports::new(&settings.runtime_package);
        Self {
            settings,
            registry,
            runtime,
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn runtime(&self) -> &RuntimeImports {
        &self.runtime
    }

    /// `proto/person_pb.ts` is imported as `./proto/person_pb.js`.
    pub fn import_path_for(&self, name: &str) -> String {
        let stem = match name.rfind('.') {
            Some(dot) if !name[dot..].contains('/') => &name[..dot],
            _ => name,
        };
        format!("./{}{}", stem, self.settings.import_extension)
    }

    pub fn new_file(&self, name: &str) -> GeneratedFile<'_> {
        GeneratedFile::new(
            name,
            self.import_path_for(name),
            &self.registry,
            &self.runtime,
            &self.settings,
        )
    }

    /// Output file for a schema file, named after the target: with
    /// `target=js`, `proto/person.proto` becomes `proto/person_pb.js`.
    /// Without a target the output is TypeScript.
    pub fn new_file_for_schema(&self, schema: &SchemaFileInfo) -> GeneratedFile<'_> {
        let extension = self.settings.target.as_deref().unwrap_or("ts");
        let name = self.registry.naming().output_name(&schema.name, extension);
        let mut file = self.new_file(&name);
        file.preamble(schema);
        file
    }

    /// Resolve and assemble every file. Suppressed empty files are skipped.
    pub fn collect<'r>(
        &'r self,
        files: impl IntoIterator<Item = GeneratedFile<'r>>,
    ) -> Result<GenerationOutput, GenerateError> {
        let mut artifacts = vec![];
        for file in files {
            if let Some(artifact) = file.into_artifact()? {
                artifacts.push(artifact);
            }
        }
        let manifest = GenerationManifest::build(
            &self.settings.plugin_name,
            &self.settings.plugin_version,
            &artifacts,
        )?;
        tracing::info!(
            files = artifacts.len(),
            manifest_hash = %manifest.manifest_hash,
            "generation finished"
        );
        Ok(GenerationOutput {
            files: artifacts,
            manifest,
        })
    }
}

/// A serialized generation request: settings, entities, and per-file lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPlan {
    #[serde(default)]
    pub settings: GeneratorSettings,
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
    #[serde(default)]
    pub files: Vec<FilePlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePlan {
    pub name: String,
    #[serde(default)]
    pub schema_file: Option<SchemaFileInfo>,
    #[serde(default)]
    pub keep_empty: Option<bool>,
    /// Each entry is printed as one line.
    #[serde(default)]
    pub lines: Vec<Value>,
}

impl GenerationPlan {
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Execute a plan. `parameter` overrides settings the way a plugin
/// parameter would.
pub fn run_plan(plan: &GenerationPlan, parameter: Option<&str>) -> Result<GenerationOutput, GenerateError> {
    let mut settings = plan.settings.clone();
    if let Some(parameter) = parameter {
        settings.apply_parameter(parameter)?;
    }
    let mut registry = SymbolRegistry::new(settings.file_naming());
    for entity in &plan.entities {
        registry.register(entity.clone());
    }
    let run = GenerationRun::new(settings, registry);

    let mut files = Vec::with_capacity(plan.files.len());
    for file_plan in &plan.files {
        let mut file = run.new_file(&file_plan.name);
        if let Some(schema) = &file_plan.schema_file {
            file.preamble(schema);
        }
        if let Some(keep_empty) = file_plan.keep_empty {
            file.set_keep_empty(keep_empty);
        }
        for line in &file_plan.lines {
            let printable = decode_printable(line, &file)?;
            file.print([printable])?;
        }
        files.push(file);
    }
    run.collect(files)
}

/// Decode one JSON value into a printable.
///
/// Strings, booleans, numbers and arrays map directly. Objects carry one of
/// `int64`, `number`, `bytes` (base64), `type`, `import` + `from`, `export`,
/// or `jsdoc` (+ `indent`). Anything else is unsupported.
pub fn decode_printable(value: &Value, file: &GeneratedFile<'_>) -> Result<Printable, GenerateError> {
    match value {
        Value::String(s) => Ok(Printable::Text(s.clone())),
        Value::Bool(b) => Ok(Printable::Bool(*b)),
        Value::Number(n) => n
            .as_f64()
            .map(Printable::Number)
            .ok_or_else(|| GenerateError::unsupported(format!("number {}", n))),
        Value::Array(items) => items
            .iter()
            .map(|item| decode_printable(item, file))
            .collect::<Result<Vec<_>, _>>()
            .map(Printable::Seq),
        Value::Object(map) => decode_object(map, file),
        Value::Null => Err(GenerateError::unsupported("null")),
    }
}

fn decode_object(map: &Map<String, Value>, file: &GeneratedFile<'_>) -> Result<Printable, GenerateError> {
    let type_only = map.get("typeOnly").and_then(Value::as_bool).unwrap_or(false);

    if let Some(value) = map.get("int64") {
        let parsed = match value {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        return parsed
            .map(Printable::Int64)
            .ok_or_else(|| GenerateError::unsupported(format!("int64 {}", value)));
    }
    if let Some(value) = map.get("number") {
        let parsed = match value {
            Value::String(s) if s == "NaN" => Some(f64::NAN),
            Value::String(s) if s == "Infinity" => Some(f64::INFINITY),
            Value::String(s) if s == "-Infinity" => Some(f64::NEG_INFINITY),
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        return parsed
            .map(Printable::Number)
            .ok_or_else(|| GenerateError::unsupported(format!("number {}", value)));
    }
    if let Some(value) = map.get("bytes") {
        let decoded = value
            .as_str()
            .and_then(|s| base64::engine::general_purpose::STANDARD.decode(s).ok());
        return decoded
            .map(Printable::Bytes)
            .ok_or_else(|| GenerateError::unsupported(format!("bytes {}", value)));
    }
    if let Some(Value::String(type_name)) = map.get("type") {
        return Ok(Printable::Entity(EntityRef {
            type_name: type_name.clone(),
            type_only,
        }));
    }
    if let Some(Value::String(name)) = map.get("import") {
        let from = map.get("from").and_then(Value::as_str).unwrap_or_default();
        let symbol = file.import_from(name, from)?;
        let symbol = if type_only { symbol.to_type_only() } else { symbol };
        return Ok(Printable::Symbol(symbol));
    }
    if let Some(Value::String(name)) = map.get("export") {
        return Ok(Printable::Symbol(file.export(name)));
    }
    if let Some(value) = map.get("jsdoc") {
        let mut block = JsDocBlock::new();
        match value {
            Value::String(text) => block.add(text),
            Value::Array(items) => {
                for item in items {
                    let text = item
                        .as_str()
                        .ok_or_else(|| GenerateError::unsupported(format!("jsdoc {}", item)))?;
                    block.add(text);
                }
            }
            _ => return Err(GenerateError::unsupported(format!("jsdoc {}", value))),
        }
        let indent = map.get("indent").and_then(Value::as_str).unwrap_or_default();
        return Ok(Printable::Text(block.to_indented_string(indent)));
    }

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    Err(GenerateError::unsupported(format!("object {{{}}}", keys.join(", "))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan(files: Value) -> GenerationPlan {
        serde_json::from_value(json!({
            "settings": { "pluginName": "protoc-gen-test", "pluginVersion": "v1.0.0" },
            "entities": [
                { "typeName": "example.Person", "kind": "message", "file": "proto/person.proto", "package": "example" }
            ],
            "files": files,
        }))
        .unwrap()
    }

    #[test]
    fn test_import_path_for() {
        let run = GenerationRun::new(GeneratorSettings::default(), SymbolRegistry::default());
        assert_eq!(run.import_path_for("proto/person_pb.ts"), "./proto/person_pb.js");
        assert_eq!(run.import_path_for("a.b/c"), "./a.b/c.js");
    }

    #[test]
    fn test_run_plan_renders_all_kinds() {
        let plan = plan(json!([{
            "name": "proto/user_pb.ts",
            "lines": [
                ["const p: ", { "type": "example.Person", "typeOnly": true }, " = new ", { "type": "example.Person" }, "();"],
                ["const n = ", { "int64": "-42" }, ";"],
                ["const z = ", { "int64": 0 }, ";"],
                ["const b = ", { "bytes": "AP8Q" }, ";"],
                ["const f = ", 1.5, ", g = ", { "number": "NaN" }, ", ok = ", true, ";"],
                ["export const ", { "export": "User" }, " = ", { "import": "helper", "from": "./lib/helper.js" }, ";"]
            ]
        }]));
        let output = run_plan(&plan, None).unwrap();
        assert_eq!(output.files.len(), 1);
        assert_eq!(
            output.files[0].content,
            "import {Person} from \"./person_pb.js\";\n\
             import {protoInt64} from \"@bufbuild/protobuf\";\n\
             import {helper} from \"../lib/helper.js\";\n\
             \n\
             const p: Person = new Person();\n\
             const n = protoInt64.parse(\"-42\");\n\
             const z = protoInt64.zero;\n\
             const b = new Uint8Array([0x00, 0xFF, 0x10]);\n\
             const f = 1.5, g = globalThis.Number.NaN, ok = true;\n\
             export const User = helper;\n"
        );
    }

    #[test]
    fn test_unsupported_values_abort_the_run() {
        for bad in [json!(null), json!({ "what": 1 }), json!({ "int64": "1.5" }), json!({ "bytes": "!!" })] {
            let plan = plan(json!([{ "name": "a_pb.ts", "lines": [bad] }]));
            let err = run_plan(&plan, None).unwrap_err();
            assert!(matches!(err, GenerateError::UnsupportedPrintable { .. }), "{}", err);
        }
    }

    #[test]
    fn test_import_without_source_path() {
        let plan = plan(json!([{ "name": "a_pb.ts", "lines": [{ "import": "Foo" }] }]));
        let err = run_plan(&plan, None).unwrap_err();
        assert!(matches!(err, GenerateError::MissingSourcePath { .. }));
    }

    #[test]
    fn test_parameter_controls_empty_files() {
        let plan = plan(json!([{ "name": "empty_pb.ts" }, { "name": "full_pb.ts", "lines": ["x"] }]));

        let output = run_plan(&plan, None).unwrap();
        let names: Vec<_> = output.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["full_pb.ts"]);

        let output = run_plan(&plan, Some("keep_empty_files=true")).unwrap();
        assert_eq!(output.files.len(), 2);
        assert_eq!(output.files[0].content, "");
        assert_eq!(output.manifest.files.len(), 2);
    }

    #[test]
    fn test_jsdoc_lines() {
        let doc_plan = plan(json!([{
            "name": "doc_pb.ts",
            "lines": [
                { "jsdoc": [" A person.", "", " @generated from message example.Person"] },
                ["export class ", { "export": "Person" }, " {"],
                { "jsdoc": " Closes with */ inline\n", "indent": "  " },
                "}"
            ]
        }]));
        let output = run_plan(&doc_plan, None).unwrap();
        assert_eq!(
            output.files[0].content,
            "/**\n * A person.\n *\n * @generated from message example.Person\n */\n\
             export class Person {\n\
             \x20 /**\n   * Closes with *\\/ inline\n   */\n\
             }\n"
        );

        let bad_plan = plan(json!([{ "name": "a_pb.ts", "lines": [{ "jsdoc": 3 }] }]));
        let err = run_plan(&bad_plan, None).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedPrintable { .. }));
    }

    #[test]
    fn test_schema_file_named_after_target() {
        let schema = SchemaFileInfo {
            name: "proto/person.proto".to_string(),
            package: Some("example".to_string()),
            syntax: "proto3".to_string(),
            syntax_comments: Default::default(),
            package_comments: Default::default(),
        };

        let run = GenerationRun::new(GeneratorSettings::default(), SymbolRegistry::default());
        assert_eq!(run.new_file_for_schema(&schema).name(), "proto/person_pb.ts");

        let mut settings = GeneratorSettings::default();
        settings.apply_parameter("target=js").unwrap();
        let run = GenerationRun::new(settings, SymbolRegistry::default());
        let file = run.new_file_for_schema(&schema);
        assert_eq!(file.name(), "proto/person_pb.js");
        assert_eq!(file.import_path(), "./proto/person_pb.js");
    }

    #[test]
    fn test_preamble_from_schema_file() {
        let plan = plan(json!([{
            "name": "proto/person_pb.ts",
            "schemaFile": { "name": "proto/person.proto", "package": "example" },
            "lines": [["export class ", { "export": "Person" }, " {}"]]
        }]));
        let output = run_plan(&plan, Some("target=ts")).unwrap();
        assert_eq!(
            output.files[0].content,
            "// @generated by protoc-gen-test v1.0.0 with parameter \"target=ts\"\n\
             // @generated from file proto/person.proto (package example, syntax proto3)\n\
             /* eslint-disable */\n\
             /* @ts-nocheck */\n\
             \n\
             export class Person {}\n"
        );
    }
}
