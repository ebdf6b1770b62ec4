//! Symbol Registry - the type import cache shared by every file of a run
//!
//! Entities (messages and enums) are registered up front. Resolving one
//! yields the same symbol no matter which file asks, or from which thread.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use crate::error::GenerateError;
use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Message,
    Enum,
}

/// A message or enum declared in a schema file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    /// Fully qualified name, e.g. `example.Person.Address`.
    pub type_name: String,
    pub kind: EntityKind,
    /// Schema file declaring the entity, e.g. `proto/person.proto`.
    pub file: String,
    #[serde(default)]
    pub package: Option<String>,
}

impl EntityDescriptor {
    /// Name of the generated declaration: the package prefix is dropped and
    /// nesting is flattened with `_`.
    pub fn local_name(&self) -> String {
        let relative = match self.package.as_deref() {
            Some(pkg) if !pkg.is_empty() => self
                .type_name
                .strip_prefix(pkg)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(&self.type_name),
            _ => &self.type_name,
        };
        relative.replace('.', "_")
    }
}

/// A printable reference to a registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub type_name: String,
    #[serde(default)]
    pub type_only: bool,
}

impl EntityRef {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            type_only: false,
        }
    }

    pub fn type_only(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            type_only: true,
        }
    }
}

/// How schema files map to generated import paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub suffix: String,
    pub import_extension: String,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            suffix: "_pb".to_string(),
            import_extension: ".js".to_string(),
        }
    }
}

impl FileNaming {
    /// `proto/person.proto` becomes `./proto/person_pb.js`.
    pub fn import_path(&self, schema_file: &str) -> String {
        let stem = schema_file.strip_suffix(".proto").unwrap_or(schema_file);
        format!("./{}{}{}", stem, self.suffix, self.import_extension)
    }

    /// `proto/person.proto` becomes `proto/person_pb.<ext>`.
    pub fn output_name(&self, schema_file: &str, extension: &str) -> String {
        let stem = schema_file.strip_suffix(".proto").unwrap_or(schema_file);
        format!("{}{}.{}", stem, self.suffix, extension)
    }
}

/// Type import cache - registers entities and memoizes their symbols
pub struct SymbolRegistry {
    naming: FileNaming,
    entities: HashMap<String, EntityDescriptor>,
    symbols: RwLock<HashMap<String, Symbol>>,
}

impl SymbolRegistry {
    pub fn new(naming: FileNaming) -> Self {
        Self {
            naming,
            entities: HashMap::new(),
            symbols: RwLock::new(HashMap::new()),
        }
    }

    /// Load entity descriptors from a JSON array on disk.
    pub fn load_from_file(path: &Path, naming: FileNaming) -> Result<Self, GenerateError> {
        let content = fs::read_to_string(path)?;
        let entities: Vec<EntityDescriptor> = serde_json::from_str(&content)?;
        let mut registry = Self::new(naming);
        for entity in entities {
            registry.register(entity);
        }
        Ok(registry)
    }

    pub fn naming(&self) -> &FileNaming {
        &self.naming
    }

    pub fn register(&mut self, entity: EntityDescriptor) {
        self.entities.insert(entity.type_name.clone(), entity);
    }

    pub fn get(&self, type_name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(type_name)
    }

    /// All registered entities, ordered by type name.
    pub fn list(&self) -> Vec<&EntityDescriptor> {
        let mut entities: Vec<_> = self.entities.values().collect();
        entities.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        entities
    }

    /// Symbol for a name declared by the file at `home_path`.
    pub fn declare_local(&self, name: &str, home_path: &str) -> Symbol {
        Symbol::new(name, home_path)
    }

    /// Symbol for an arbitrary name exported by a file or package.
    pub fn import_from(&self, name: &str, from: &str) -> Result<Symbol, GenerateError> {
        if from.is_empty() {
            return Err(GenerateError::MissingSourcePath {
                name: name.to_string(),
            });
        }
        Ok(Symbol::new(name, from))
    }

    /// Symbol for a registered entity, created on first request.
    pub fn resolve_external(&self, type_name: &str) -> Result<Symbol, GenerateError> {
        {
            let cache = self.symbols.read().unwrap_or_else(|e| e.into_inner());
            if let Some(symbol) = cache.get(type_name) {
                return Ok(symbol.clone());
            }
        }

        let entity = self
            .entities
            .get(type_name)
            .ok_or_else(|| GenerateError::UnknownEntity(type_name.to_string()))?;

        let mut cache = self.symbols.write().unwrap_or_else(|e| e.into_inner());
        let symbol = cache
            .entry(type_name.to_string())
            .or_insert_with(|| {
                tracing::trace!(type_name, "type import created");
                Symbol::new(entity.local_name(), self.naming.import_path(&entity.file))
            })
            .clone();
        Ok(symbol)
    }

    pub fn resolve_ref(&self, entity: &EntityRef) -> Result<Symbol, GenerateError> {
        let symbol = self.resolve_external(&entity.type_name)?;
        Ok(if entity.type_only {
            symbol.to_type_only()
        } else {
            symbol
        })
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new(FileNaming::default())
    }
}

/// Symbols exported by the runtime library package.
#[derive(Debug, Clone)]
pub struct RuntimeImports {
    pub message: Symbol,
    pub proto2: Symbol,
    pub proto3: Symbol,
    pub proto_int64: Symbol,
    pub partial_message: Symbol,
    pub plain_message: Symbol,
    pub field_list: Symbol,
    pub binary_read_options: Symbol,
    pub json_read_options: Symbol,
    pub json_value: Symbol,
}

pub const DEFAULT_RUNTIME_PACKAGE: &str = "@bufbuild/protobuf";

impl RuntimeImports {
    pub fn new(package: &str) -> Self {
        let value = |name: &str| Symbol::new(name, package);
        let type_only = |name: &str| Symbol::new(name, package).to_type_only();
        Self {
            message: value("Message"),
            proto2: value("proto2"),
            proto3: value("proto3"),
            proto_int64: value("protoInt64"),
            partial_message: type_only("PartialMessage"),
            plain_message: type_only("PlainMessage"),
            field_list: type_only("FieldList"),
            binary_read_options: type_only("BinaryReadOptions"),
            json_read_options: type_only("JsonReadOptions"),
            json_value: type_only("JsonValue"),
        }
    }
}

impl Default for RuntimeImports {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_PACKAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> EntityDescriptor {
        EntityDescriptor {
            type_name: "example.Person.Address".to_string(),
            kind: EntityKind::Message,
            file: "proto/person.proto".to_string(),
            package: Some("example".to_string()),
        }
    }

    #[test]
    fn test_local_name_flattens_nesting() {
        assert_eq!(person().local_name(), "Person_Address");

        let unpackaged = EntityDescriptor {
            package: None,
            type_name: "Status".to_string(),
            ..person()
        };
        assert_eq!(unpackaged.local_name(), "Status");
    }

    #[test]
    fn test_import_path_from_schema_file() {
        let naming = FileNaming::default();
        assert_eq!(naming.import_path("proto/person.proto"), "./proto/person_pb.js");
        assert_eq!(naming.output_name("proto/person.proto", "ts"), "proto/person_pb.ts");
    }

    #[test]
    fn test_resolve_external_is_memoized() {
        let mut registry = SymbolRegistry::default();
        registry.register(person());

        let a = registry.resolve_external("example.Person.Address").unwrap();
        let b = registry.resolve_external("example.Person.Address").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name, "Person_Address");
        assert_eq!(a.from, "./proto/person_pb.js");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"typeName": "example.Status", "kind": "enum", "file": "status.proto", "package": "example"}},
               {{"typeName": "example.Person", "kind": "message", "file": "person.proto"}}]"#
        )
        .unwrap();

        let naming = FileNaming {
            suffix: "_pb".to_string(),
            import_extension: ".ts".to_string(),
        };
        let registry = SymbolRegistry::load_from_file(file.path(), naming).unwrap();
        let names: Vec<_> = registry.list().iter().map(|e| e.type_name.as_str()).collect();
        assert_eq!(names, vec!["example.Person", "example.Status"]);
        assert_eq!(registry.get("example.Status").unwrap().kind, EntityKind::Enum);

        // no package: the full type name is the local name
        let person = registry.resolve_external("example.Person").unwrap();
        assert_eq!(person.name, "example_Person");
        assert_eq!(person.from, "./person_pb.ts");
    }

    #[test]
    fn test_unknown_entity() {
        let registry = SymbolRegistry::default();
        let err = registry.resolve_external("example.Missing").unwrap_err();
        assert!(matches!(err, GenerateError::UnknownEntity(_)));
    }

    #[test]
    fn test_import_from_requires_source_path() {
        let registry = SymbolRegistry::default();
        let err = registry.import_from("Foo", "").unwrap_err();
        assert!(err.to_string().contains("without a source path"));
        assert!(registry.import_from("Foo", "./foo.js").is_ok());
    }

    #[test]
    fn test_resolve_ref_type_only() {
        let mut registry = SymbolRegistry::default();
        registry.register(person());
        let symbol = registry
            .resolve_ref(&EntityRef::type_only("example.Person.Address"))
            .unwrap();
        assert!(symbol.type_only);
    }

    #[test]
    fn test_runtime_imports_type_only_flags() {
        let rt = RuntimeImports::default();
        assert!(!rt.proto_int64.type_only);
        assert!(rt.partial_message.type_only);
        assert_eq!(rt.message.from, DEFAULT_RUNTIME_PACKAGE);
    }
}
