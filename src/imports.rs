//! Import Resolver
//!
//! Runs once per file over the complete token list:
//! 1. classify symbols as local or foreign, value or type-only
//! 2. give every foreign entity a unique local identifier
//! 3. group foreign entities by home path
//! 4. emit import statements in first-occurrence order

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::GenerateError;
use crate::import_path::make_import_path_relative;
use crate::print::{literal_string, Token};
use crate::symbol::{Symbol, SymbolId};

/// `$` cannot appear in schema identifiers, so aliases never shadow a
/// declared name.
pub const ALIAS_SEPARATOR: char = '$';

#[cfg(feature = "test-hooks")]
thread_local! {
    static RESOLVE_CALL_COUNT: std::cell::Cell<u32> = std::cell::Cell::new(0);
}

/// Number of resolution passes run on the current thread.
#[cfg(feature = "test-hooks")]
pub fn get_resolve_call_count() -> u32 {
    RESOLVE_CALL_COUNT.with(|c| c.get())
}

#[cfg(feature = "test-hooks")]
pub fn reset_resolve_call_count() {
    RESOLVE_CALL_COUNT.with(|c| c.set(0));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

impl fmt::Display for ImportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.name, alias),
            None => f.write_str(&self.name),
        }
    }
}

/// One `import {...} from "...";` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub type_only: bool,
    /// Already relative to the importing file.
    pub from: String,
    pub names: Vec<ImportName>,
}

impl fmt::Display for ImportStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.names.iter().map(ToString::to_string).collect();
        let keyword = if self.type_only { "import type" } else { "import" };
        write!(
            f,
            "{} {{{}}} from {};",
            keyword,
            names.join(", "),
            literal_string(&self.from)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportResolution {
    pub statements: Vec<ImportStatement>,
    pub identifiers: HashMap<SymbolId, String>,
}

impl ImportResolution {
    pub fn identifier(&self, symbol: &Symbol) -> Option<&str> {
        self.identifiers.get(&symbol.id).map(String::as_str)
    }

    /// The import block, one statement per line.
    pub fn render_block(&self) -> String {
        self.statements
            .iter()
            .map(|s| format!("{}\n", s))
            .collect()
    }
}

#[derive(Default)]
struct ImportGroup {
    types: HashMap<String, Option<String>>,
    values: HashMap<String, Option<String>>,
}

/// Case-insensitive, then byte order, so `proto3` sorts before `Timestamp`
/// but the result never depends on locale.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn build_names(map: HashMap<String, Option<String>>) -> Vec<ImportName> {
    let mut names: Vec<ImportName> = map
        .into_iter()
        .map(|(name, alias)| ImportName { name, alias })
        .collect();
    names.sort_by(|a, b| compare_names(&a.name, &b.name));
    names
}

fn next_free_alias(name: &str, taken: &HashSet<String>) -> Result<String, GenerateError> {
    let mut suffix: u32 = 1;
    loop {
        let alias = format!("{}{}{}", name, ALIAS_SEPARATOR, suffix);
        if !taken.contains(&alias) {
            return Ok(alias);
        }
        suffix = suffix
            .checked_add(1)
            .ok_or_else(|| GenerateError::AliasExhaustion {
                name: name.to_string(),
            })?;
    }
}

/// Resolve the imports of the file whose own import path is `import_path`.
pub fn resolve_imports(tokens: &[Token], import_path: &str) -> Result<ImportResolution, GenerateError> {
    #[cfg(feature = "test-hooks")]
    RESOLVE_CALL_COUNT.with(|c| c.set(c.get() + 1));

    let mut identifiers: HashMap<SymbolId, String> = HashMap::new();
    let mut is_value: HashSet<&SymbolId> = HashSet::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut foreign: Vec<&Symbol> = vec![];

    for token in tokens {
        let Token::Symbol(symbol) = token else {
            continue;
        };
        identifiers.insert(symbol.id.clone(), symbol.name.clone());
        // an entity stays type-only as long as every use is type-only
        if !symbol.type_only {
            is_value.insert(&symbol.id);
        }
        if symbol.is_local_to(import_path) {
            taken.insert(symbol.name.clone());
        } else {
            foreign.push(symbol);
        }
    }

    let mut handled: HashSet<&SymbolId> = HashSet::new();
    for &symbol in &foreign {
        if !handled.insert(&symbol.id) {
            continue;
        }
        if taken.insert(symbol.name.clone()) {
            continue;
        }
        let alias = next_free_alias(&symbol.name, &taken)?;
        tracing::debug!(
            name = %symbol.name,
            from = %symbol.from,
            alias = %alias,
            "import aliased"
        );
        taken.insert(alias.clone());
        identifiers.insert(symbol.id.clone(), alias);
    }

    let mut order: Vec<&str> = vec![];
    let mut groups: HashMap<&str, ImportGroup> = HashMap::new();
    for &symbol in &foreign {
        let group = groups.entry(symbol.from.as_str()).or_insert_with(|| {
            order.push(symbol.from.as_str());
            ImportGroup::default()
        });
        let alias = identifiers
            .get(&symbol.id)
            .filter(|ident| **ident != symbol.name)
            .cloned();
        if is_value.contains(&symbol.id) {
            group.values.insert(symbol.name.clone(), alias);
        } else {
            group.types.insert(symbol.name.clone(), alias);
        }
    }

    let mut statements = vec![];
    for from in order {
        let Some(group) = groups.remove(from) else {
            continue;
        };
        let relative = make_import_path_relative(import_path, from);
        // type-only statement first, then the value statement
        if !group.types.is_empty() {
            statements.push(ImportStatement {
                type_only: true,
                from: relative.clone(),
                names: build_names(group.types),
            });
        }
        if !group.values.is_empty() {
            statements.push(ImportStatement {
                type_only: false,
                from: relative,
                names: build_names(group.values),
            });
        }
    }

    Ok(ImportResolution {
        statements,
        identifiers,
    })
}
