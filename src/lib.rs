//! Protoplug Core - generated file assembly and import resolution
//!
//! # Guarantees
//! 1. Every identifier in a file is unique
//! 2. Names declared by a file are never aliased
//! 3. An entity used as a value anywhere is value-imported
//! 4. Output depends only on what was printed, in what order
//! 5. Errors abort the run, nothing half-resolved is emitted

pub mod symbol;
pub mod registry;
pub mod print;
pub mod import_path;
pub mod imports;
pub mod file;
pub mod preamble;
pub mod config;
pub mod hashing;
pub mod pipeline;
pub mod error;

pub use symbol::{Symbol, SymbolId};
pub use registry::{EntityDescriptor, EntityKind, EntityRef, FileNaming, RuntimeImports, SymbolRegistry};
pub use print::{Printable, Renderer, Token};
pub use imports::{resolve_imports, ImportResolution, ImportStatement};
pub use file::{assemble, GeneratedArtifact, GeneratedFile};
pub use preamble::{make_file_preamble, CommentSet, JsDocBlock, SchemaFileInfo};
pub use config::GeneratorSettings;
pub use hashing::{canonical_json, sha256_hex, GenerationManifest};
pub use pipeline::{run_plan, GenerationOutput, GenerationPlan, GenerationRun};
pub use error::GenerateError;

pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
