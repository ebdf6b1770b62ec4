//! Symbols - canonical handles for declared entities
//!
//! A symbol names something declared in a generated file or in a package.
//! Its identity is the pair of home path and declared name, so two symbols
//! created independently for the same entity always compare equal by id.

use std::fmt;

/// Identity of a declared entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    from: String,
    name: String,
}

impl SymbolId {
    pub fn new(name: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import(\"{}\").{}", self.from, self.name)
    }
}

/// A reference to a declared entity, as printed into a file.
///
/// `type_only` belongs to the reference, not to the entity: the same entity
/// can be referenced as a type in one place and as a value in another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub from: String,
    pub type_only: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, from: impl Into<String>) -> Self {
        let name = name.into();
        let from = from.into();
        Self {
            id: SymbolId::new(name.clone(), from.clone()),
            name,
            from,
            type_only: false,
        }
    }

    /// Same entity, referenced in a type-only position.
    pub fn to_type_only(&self) -> Self {
        Self {
            type_only: true,
            ..self.clone()
        }
    }

    pub fn is_local_to(&self, import_path: &str) -> bool {
        self.from == import_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_type_only() {
        let value = Symbol::new("Person", "./person_pb.js");
        let ty = value.to_type_only();
        assert_eq!(value.id, ty.id);
        assert!(ty.type_only);
        assert!(!value.type_only);
    }

    #[test]
    fn test_same_name_different_home_is_distinct() {
        let a = Symbol::new("Foo", "./a_pb.js");
        let b = Symbol::new("Foo", "./b_pb.js");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_id_display() {
        let s = Symbol::new("Message", "@bufbuild/protobuf");
        assert_eq!(s.id.to_string(), r#"import("@bufbuild/protobuf").Message"#);
    }
}
