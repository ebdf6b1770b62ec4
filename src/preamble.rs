//! File preamble and comment rendering.
//!
//! The preamble sits above the import block: license comments carried over
//! from the schema file, the generator banner, and lint suppressions.

use serde::{Deserialize, Serialize};

use crate::config::GeneratorSettings;

/// Comments attached to one element of a schema file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSet {
    #[serde(default)]
    pub leading_detached: Vec<String>,
    #[serde(default)]
    pub leading: String,
}

/// The parts of a schema file that show up in the preamble.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFileInfo {
    pub name: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default = "default_syntax")]
    pub syntax: String,
    /// Comments on the `syntax` statement, usually the license header.
    #[serde(default)]
    pub syntax_comments: CommentSet,
    #[serde(default)]
    pub package_comments: CommentSet,
}

fn default_syntax() -> String {
    "proto3".to_string()
}

fn write_comment_lines(out: &mut String, comment: &str) {
    let comment = comment.strip_suffix('\n').unwrap_or(comment);
    for line in comment.split('\n') {
        out.push_str("//");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
}

fn write_leading_comments(out: &mut String, comments: &CommentSet) {
    for detached in &comments.leading_detached {
        write_comment_lines(out, detached);
    }
    if !comments.leading.is_empty() {
        write_comment_lines(out, &comments.leading);
    }
}

/// Build the preamble for a file generated from `file`.
pub fn make_file_preamble(settings: &GeneratorSettings, file: &SchemaFileInfo) -> String {
    let mut out = String::new();
    write_leading_comments(&mut out, &file.syntax_comments);

    out.push_str(&format!(
        "// @generated by {} {}",
        settings.plugin_name, settings.plugin_version
    ));
    if let Some(parameter) = settings.parameter.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(&format!(" with parameter \"{}\"", parameter));
    }
    out.push('\n');

    out.push_str(&format!("// @generated from file {} (", file.name));
    if let Some(package) = file.package.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("package {}, ", package));
    }
    out.push_str(&format!("syntax {})\n", file.syntax));

    if settings.eslint_disable {
        out.push_str("/* eslint-disable */\n");
    }
    if settings.ts_nocheck {
        out.push_str("/* @ts-nocheck */\n");
    }
    out.push('\n');
    write_leading_comments(&mut out, &file.package_comments);

    if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// A `/** ... */` documentation block.
#[derive(Debug, Clone, Default)]
pub struct JsDocBlock {
    lines: Vec<String>,
}

impl JsDocBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add text; a closing `*/` inside the text is escaped.
    pub fn add(&mut self, text: &str) {
        let text = text.strip_suffix('\n').unwrap_or(text);
        let text = text.replace("*/", "*\\/");
        self.lines.extend(text.split('\n').map(String::from));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_indented_string(&self, indent: &str) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = format!("{}/**\n", indent);
        for line in &self.lines {
            out.push_str(&format!("{} *{}\n", indent, line));
        }
        out.push_str(&format!("{} */", indent));
        out
    }
}
