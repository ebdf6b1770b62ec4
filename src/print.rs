//! Printable Renderer
//!
//! Flattens nested printable values into the flat token list of one file.
//! Symbols stay symbolic until the file is resolved; everything else becomes
//! literal text here.

use crate::error::GenerateError;
use crate::registry::{EntityRef, RuntimeImports, SymbolRegistry};
use crate::symbol::Symbol;

/// Everything that can be printed into a generated file.
#[derive(Debug, Clone, PartialEq)]
pub enum Printable {
    Text(String),
    Bool(bool),
    Number(f64),
    Int64(i64),
    Bytes(Vec<u8>),
    Symbol(Symbol),
    Entity(EntityRef),
    Seq(Vec<Printable>),
}

impl From<&str> for Printable {
    fn from(value: &str) -> Self {
        Printable::Text(value.to_string())
    }
}

impl From<String> for Printable {
    fn from(value: String) -> Self {
        Printable::Text(value)
    }
}

impl From<bool> for Printable {
    fn from(value: bool) -> Self {
        Printable::Bool(value)
    }
}

impl From<f64> for Printable {
    fn from(value: f64) -> Self {
        Printable::Number(value)
    }
}

impl From<i64> for Printable {
    fn from(value: i64) -> Self {
        Printable::Int64(value)
    }
}

impl From<&[u8]> for Printable {
    fn from(value: &[u8]) -> Self {
        Printable::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Printable {
    fn from(value: Vec<u8>) -> Self {
        Printable::Bytes(value)
    }
}

impl From<Symbol> for Printable {
    fn from(value: Symbol) -> Self {
        Printable::Symbol(value)
    }
}

impl From<&Symbol> for Printable {
    fn from(value: &Symbol) -> Self {
        Printable::Symbol(value.clone())
    }
}

impl From<EntityRef> for Printable {
    fn from(value: EntityRef) -> Self {
        Printable::Entity(value)
    }
}

impl From<Vec<Printable>> for Printable {
    fn from(value: Vec<Printable>) -> Self {
        Printable::Seq(value)
    }
}

/// One element of a file body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Symbol(Symbol),
}

impl Token {
    pub fn text(value: impl Into<String>) -> Self {
        Token::Text(value.into())
    }
}

/// Renders printables against the run's registry and runtime imports.
pub struct Renderer<'a> {
    registry: &'a SymbolRegistry,
    runtime: &'a RuntimeImports,
}

impl<'a> Renderer<'a> {
    pub fn new(registry: &'a SymbolRegistry, runtime: &'a RuntimeImports) -> Self {
        Self { registry, runtime }
    }

    pub fn render(&self, value: &Printable) -> Result<Vec<Token>, GenerateError> {
        let mut tokens = vec![];
        self.render_into(value, &mut tokens)?;
        Ok(tokens)
    }

    /// Depth-first, left to right.
    pub fn render_into(&self, value: &Printable, out: &mut Vec<Token>) -> Result<(), GenerateError> {
        match value {
            Printable::Text(text) => out.push(Token::text(text.as_str())),
            Printable::Bool(b) => out.push(Token::text(b.to_string())),
            Printable::Number(n) => out.push(Token::text(literal_number(*n))),
            Printable::Int64(n) => out.extend(self.literal_int64(*n)),
            Printable::Bytes(bytes) => out.push(Token::text(literal_bytes(bytes))),
            Printable::Symbol(symbol) => out.push(Token::Symbol(symbol.clone())),
            Printable::Entity(entity) => out.push(Token::Symbol(self.registry.resolve_ref(entity)?)),
            Printable::Seq(items) => {
                for item in items {
                    self.render_into(item, out)?;
                }
            }
        }
        Ok(())
    }

    fn literal_int64(&self, value: i64) -> Vec<Token> {
        let int64 = Token::Symbol(self.runtime.proto_int64.clone());
        if value == 0 {
            return vec![int64, Token::text(".zero")];
        }
        vec![
            int64,
            Token::text(".parse("),
            Token::text(literal_string(&value.to_string())),
            Token::text(")"),
        ]
    }
}

/// Number literal that does not depend on the host's float formatting.
pub fn literal_number(value: f64) -> String {
    if value.is_nan() {
        return "globalThis.Number.NaN".to_string();
    }
    if value == f64::INFINITY {
        return "globalThis.Number.POSITIVE_INFINITY".to_string();
    }
    if value == f64::NEG_INFINITY {
        return "globalThis.Number.NEGATIVE_INFINITY".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        // 1e21 -> "1e+21", matching the exponent form of the target language
        let exp = format!("{:e}", value);
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
            _ => exp,
        };
    }
    value.to_string()
}

/// `new Uint8Array([0x00, 0xFF])`, or `new Uint8Array(0)` when empty.
pub fn literal_bytes(value: &[u8]) -> String {
    if value.is_empty() {
        return "new Uint8Array(0)".to_string();
    }
    let bytes: Vec<String> = value.iter().map(|b| format!("0x{:02X}", b)).collect();
    format!("new Uint8Array([{}])", bytes.join(", "))
}

/// Double-quoted string literal.
pub fn literal_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
