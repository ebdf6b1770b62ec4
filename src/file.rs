//! Generated files - accumulate now, resolve once
//!
//! A `GeneratedFile` records an append-only token log. Imports are resolved
//! when the file is turned into an artifact, which consumes the builder.

use serde::{Deserialize, Serialize};

use crate::config::GeneratorSettings;
use crate::error::GenerateError;
use crate::imports::{resolve_imports, ImportResolution};
use crate::preamble::{make_file_preamble, SchemaFileInfo};
use crate::print::{Printable, Renderer, Token};
use crate::registry::{EntityRef, RuntimeImports, SymbolRegistry};
use crate::symbol::Symbol;

/// Final content of one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub name: String,
    pub content: String,
}

pub struct GeneratedFile<'r> {
    name: String,
    import_path: String,
    preamble: Option<String>,
    tokens: Vec<Token>,
    keep_empty: bool,
    registry: &'r SymbolRegistry,
    runtime: &'r RuntimeImports,
    settings: &'r GeneratorSettings,
}

impl<'r> GeneratedFile<'r> {
    pub fn new(
        name: impl Into<String>,
        import_path: impl Into<String>,
        registry: &'r SymbolRegistry,
        runtime: &'r RuntimeImports,
        settings: &'r GeneratorSettings,
    ) -> Self {
        Self {
            name: name.into(),
            import_path: import_path.into(),
            preamble: None,
            tokens: vec![],
            keep_empty: settings.keep_empty_files,
            registry,
            runtime,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    pub fn runtime(&self) -> &'r RuntimeImports {
        self.runtime
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn set_keep_empty(&mut self, keep_empty: bool) {
        self.keep_empty = keep_empty;
    }

    /// Place the standard preamble for `file` above the imports.
    pub fn preamble(&mut self, file: &SchemaFileInfo) {
        self.preamble = Some(make_file_preamble(self.settings, file));
    }

    /// Print one line.
    pub fn print<I, P>(&mut self, items: I) -> Result<(), GenerateError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Printable>,
    {
        let line = Printable::Seq(items.into_iter().map(Into::into).collect());
        self.push_line(&line)
    }

    /// Print one line from literal fragments interleaved with values, the
    /// way a tagged template is split.
    ///
    /// There must be exactly one value between each pair of fragments.
    pub fn print_tagged(&mut self, fragments: &[&str], values: Vec<Printable>) -> Result<(), GenerateError> {
        let holes = fragments.len().saturating_sub(1);
        if values.len() < holes {
            return Err(GenerateError::unsupported("missing template value"));
        }
        if values.len() > holes {
            return Err(GenerateError::unsupported("extra template value"));
        }
        let mut line = Vec::with_capacity(fragments.len() + values.len());
        let mut values = values.into_iter();
        for fragment in fragments {
            line.push(Printable::from(*fragment));
            line.extend(values.next());
        }
        self.push_line(&Printable::Seq(line))
    }

    fn push_line(&mut self, line: &Printable) -> Result<(), GenerateError> {
        let mut tokens = Renderer::new(self.registry, self.runtime).render(line)?;
        tokens.push(Token::text("\n"));
        self.tokens.append(&mut tokens);
        Ok(())
    }

    /// Reserve a name declared by this file.
    pub fn export(&self, name: &str) -> Symbol {
        self.registry.declare_local(name, &self.import_path)
    }

    /// Import a registered message or enum.
    pub fn import(&self, entity: &EntityRef) -> Result<Symbol, GenerateError> {
        self.registry.resolve_ref(entity)
    }

    /// Import any name from a file or package.
    ///
    /// `from` is project-relative (`./foo/bar_pb.js`) or a package path; it
    /// is made relative to this file when the import is emitted.
    pub fn import_from(&self, name: &str, from: &str) -> Result<Symbol, GenerateError> {
        self.registry.import_from(name, from)
    }

    /// Resolve imports and assemble the final content.
    ///
    /// Returns `None` for an empty file unless it is kept.
    pub fn into_artifact(self) -> Result<Option<GeneratedArtifact>, GenerateError> {
        let resolution = resolve_imports(&self.tokens, &self.import_path)?;
        match assemble(self.preamble.as_deref(), &resolution, &self.tokens, self.keep_empty) {
            Some(content) => Ok(Some(GeneratedArtifact {
                name: self.name,
                content,
            })),
            None => {
                tracing::debug!(name = %self.name, "empty file suppressed");
                Ok(None)
            }
        }
    }
}

/// Concatenate preamble, import block and the substituted body.
pub fn assemble(
    preamble: Option<&str>,
    resolution: &ImportResolution,
    tokens: &[Token],
    keep_empty: bool,
) -> Option<String> {
    let mut body = String::new();
    for token in tokens {
        match token {
            Token::Text(text) => body.push_str(text),
            Token::Symbol(symbol) => {
                body.push_str(resolution.identifier(symbol).unwrap_or(symbol.name.as_str()))
            }
        }
    }
    if body.is_empty() && !keep_empty {
        return None;
    }

    let mut content = String::new();
    if let Some(preamble) = preamble {
        content.push_str(preamble);
        if !preamble.ends_with('\n') {
            content.push('\n');
        }
        content.push('\n');
    }
    let imports = resolution.render_block();
    if !imports.is_empty() {
        content.push_str(&imports);
        content.push('\n');
    }
    content.push_str(&body);
    Some(content)
}
