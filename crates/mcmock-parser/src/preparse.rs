//! Pre-parser
//!
//! Extracts `#define` symbols, `#include` directives and `typedef`s from the
//! cleaned lines of one header, splits multi-statement lines, and keeps
//! every other line as the residual declaration stream.

use mcmock_core::{DefinedSymbol, Error, Result, Typedef, TypedefKind, Warning};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::lexical;
use crate::scanner::{Depth, DepthScanner};

static RE_DEFINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*define\s+(\w+)(.*)$").unwrap());
static RE_APPLICATION_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^#\s*include\s*"([^"]+)""#).unwrap());
static RE_SYSTEM_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*include\s*<([^>]+)>").unwrap());
static RE_TYPEDEF_STRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btypedef\s+struct\b").unwrap());
static RE_TYPEDEF_ENUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btypedef\s+enum\b").unwrap());
static RE_TYPEDEF_CALLBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btypedef\s+.+?\(\s*\*.*\)\s*\(.*\)").unwrap());
static RE_CALLBACK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^typedef\s+(.+?)\s*\(\s*\*\s*(\w+)\s*\)\s*\((.*)\)").unwrap()
});
static RE_MACRO_PARAMETERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\s*(?:(?:[A-Za-z_]\w*|\.\.\.)\s*(?:,\s*(?:[A-Za-z_]\w*|\.\.\.)\s*)*)?\)")
        .unwrap()
});
static RE_TRAILING_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*(?:\[[^\]]*\])?\s*$").unwrap());

/// Result of pre-parsing one header file
///
/// Immutable once built; one instance per header per run.
#[derive(Debug, Clone, Default)]
pub struct PreParsedHeader {
    name: String,
    symbols: Vec<DefinedSymbol>,
    application_includes: Vec<String>,
    system_includes: Vec<String>,
    typedefs: Vec<Typedef>,
    lines: Vec<String>,
    warnings: Vec<Warning>,
}

impl PreParsedHeader {
    /// Pre-parse raw header text
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        Self::from_lines(name, lexical::clean_lines(text))
    }

    /// Pre-parse lines that are already free of comments and blank lines
    pub fn from_lines(name: impl Into<String>, lines: Vec<String>) -> Result<Self> {
        let mut header = Self {
            name: name.into(),
            ..Default::default()
        };

        let lines = header.extract_symbols(lines);
        let lines = header.extract_includes(lines);
        let lines = split_statements(lines);
        header.lines = header.extract_typedefs(lines)?;

        debug!(
            "Pre-parsed {}: {} symbols, {} includes, {} typedefs, {} lines",
            header.name,
            header.symbols.len(),
            header.application_includes.len() + header.system_includes.len(),
            header.typedefs.len(),
            header.lines.len()
        );
        Ok(header)
    }

    /// Pre-parse rewritten residual lines of this header again
    ///
    /// Symbols and typedefs produced by macro expansion are picked up; what
    /// this instance already holds carries over ahead of them.
    pub fn reparse(&self, lines: Vec<String>) -> Result<Self> {
        let fresh = Self::from_lines(self.name.clone(), lines)?;

        let mut header = Self {
            name: self.name.clone(),
            symbols: self.symbols.clone(),
            application_includes: concat(&self.application_includes, fresh.application_includes),
            system_includes: concat(&self.system_includes, fresh.system_includes),
            typedefs: concat(&self.typedefs, fresh.typedefs),
            lines: fresh.lines,
            warnings: concat(
                &self.warnings,
                fresh
                    .warnings
                    .into_iter()
                    .filter(|w| !self.warnings.contains(w))
                    .collect(),
            ),
        };
        for symbol in fresh.symbols {
            header.insert_symbol(symbol);
        }
        Ok(header)
    }

    /// Copy of this header with extra warnings attached
    pub fn with_warnings(mut self, mut warnings: Vec<Warning>) -> Self {
        self.warnings.append(&mut warnings);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[DefinedSymbol] {
        &self.symbols
    }

    /// Names of `#include "..."` headers, in order
    pub fn application_includes(&self) -> &[String] {
        &self.application_includes
    }

    /// Names of `#include <...>` headers, in order
    pub fn system_includes(&self) -> &[String] {
        &self.system_includes
    }

    pub fn typedefs(&self) -> &[Typedef] {
        &self.typedefs
    }

    /// Residual lines not recognised as a symbol, include or typedef
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn lookup(&self, name: &str) -> Option<&DefinedSymbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    pub fn defines(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn insert_symbol(&mut self, symbol: DefinedSymbol) {
        match self.symbols.iter_mut().find(|s| s.name == symbol.name) {
            Some(existing) => *existing = symbol,
            None => self.symbols.push(symbol),
        }
    }

    /// Capture `#define` symbols; continued defines are joined onto one line
    fn extract_symbols(&mut self, lines: Vec<String>) -> Vec<String> {
        let mut working = Vec::with_capacity(lines.len());
        let mut pending: Option<String> = None;

        for line in lines {
            if let Some(mut text) = pending.take() {
                match line.strip_suffix('\\') {
                    Some(continued) => {
                        text.push(' ');
                        text.push_str(continued.trim());
                        pending = Some(text);
                    }
                    None => {
                        text.push(' ');
                        text.push_str(&line);
                        working.push(self.finish_multiline_define(text));
                    }
                }
            } else if let Some(caps) = RE_DEFINE.captures(&line) {
                if caps[2].trim().ends_with('\\') {
                    pending = Some(line[..line.len() - 1].trim_end().to_string());
                } else {
                    self.record_define(&caps[1], &caps[2], &line);
                    working.push(line);
                }
            } else {
                working.push(line);
            }
        }

        if let Some(text) = pending {
            working.push(self.finish_multiline_define(text));
        }
        working
    }

    fn finish_multiline_define(&mut self, text: String) -> String {
        if let Some(caps) = RE_DEFINE.captures(&text) {
            self.record_define(&caps[1], &caps[2], &text);
        }
        text
    }

    /// Record `#define <name><rest>` unless its parameter list is malformed
    fn record_define(&mut self, name: &str, rest: &str, text: &str) {
        let symbol = DefinedSymbol::from_define(name, rest);
        if symbol.is_function_like() && !RE_MACRO_PARAMETERS.is_match(rest) {
            warn!("Failed to parse the #define [{}]", text);
            self.warnings.push(Warning::UnparsedMacro {
                text: text.to_string(),
            });
            return;
        }
        self.insert_symbol(symbol);
    }

    fn extract_includes(&mut self, lines: Vec<String>) -> Vec<String> {
        lines
            .into_iter()
            .filter(|line| {
                if let Some(caps) = RE_APPLICATION_INCLUDE.captures(line) {
                    self.application_includes.push(caps[1].to_string());
                    false
                } else if let Some(caps) = RE_SYSTEM_INCLUDE.captures(line) {
                    self.system_includes.push(caps[1].to_string());
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Pull out `typedef` statements, which may span several lines
    fn extract_typedefs(&mut self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut working = Vec::with_capacity(lines.len());
        let mut active: Option<(String, Depth)> = None;

        for line in lines {
            let (mut text, mut depth) = match active.take() {
                Some((mut text, depth)) => {
                    text.push(' ');
                    (text, depth)
                }
                None if line.starts_with("typedef") => (String::new(), Depth::default()),
                None => {
                    working.push(line);
                    continue;
                }
            };
            let terminated = ends_statement(&mut depth, &line);
            text.push_str(&line);

            if terminated {
                self.typedefs.push(parse_typedef(&text)?);
            } else {
                active = Some((text, depth));
            }
        }

        match active {
            Some((text, _)) => Err(Error::Typedef(text)),
            None => Ok(working),
        }
    }
}

fn concat<T: Clone>(first: &[T], second: Vec<T>) -> Vec<T> {
    let mut joined = first.to_vec();
    joined.extend(second);
    joined
}

/// Feed `line` to `depth`; true if a top-level `;` was seen
fn ends_statement(depth: &mut Depth, line: &str) -> bool {
    let mut terminated = false;
    for c in line.chars() {
        depth.feed(c);
        if c == ';' && depth.brace <= 0 {
            terminated = true;
        }
    }
    terminated
}

/// Split lines at every top-level `;` that is not the last character
pub fn split_statements(lines: Vec<String>) -> Vec<String> {
    let mut expanded = Vec::with_capacity(lines.len());
    for line in lines {
        if line.starts_with('#') {
            expanded.push(line);
            continue;
        }
        let mut start = 0;
        for step in DepthScanner::new(&line) {
            let end = step.index + 1;
            if step.ch == ';' && step.depth.brace <= 0 && end < line.len() {
                push_segment(&mut expanded, &line[start..end]);
                start = end;
            }
        }
        push_segment(&mut expanded, &line[start..]);
    }
    expanded
}

fn push_segment(lines: &mut Vec<String>, segment: &str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        lines.push(segment.to_string());
    }
}

/// Kind of a typedef, by keyword pattern
pub fn typedef_kind(text: &str) -> TypedefKind {
    if RE_TYPEDEF_STRUCT.is_match(text) {
        TypedefKind::Struct
    } else if RE_TYPEDEF_ENUM.is_match(text) {
        TypedefKind::Enum
    } else if RE_TYPEDEF_CALLBACK.is_match(text) {
        TypedefKind::Callback
    } else {
        TypedefKind::Custom
    }
}

/// Classify an accumulated typedef and extract its name
pub fn parse_typedef(text: &str) -> Result<Typedef> {
    let kind = typedef_kind(text);
    let name = match kind {
        TypedefKind::Callback => {
            let caps = RE_CALLBACK_NAME
                .captures(text)
                .ok_or_else(|| Error::Typedef(text.to_string()))?;
            Some(caps[2].to_string())
        }
        TypedefKind::Struct | TypedefKind::Enum | TypedefKind::Custom => declared_name(text),
    };
    Ok(Typedef {
        kind,
        name,
        text: text.to_string(),
    })
}

/// Last identifier before the terminating `;`, after any closing brace
fn declared_name(text: &str) -> Option<String> {
    let body = text.trim_end().trim_end_matches(';');
    let tail = match body.rfind('}') {
        Some(idx) => &body[idx + 1..],
        None => body,
    };
    let name = RE_TRAILING_IDENT.captures(tail)?.get(1)?.as_str();
    match name {
        "typedef" | "struct" | "enum" | "union" => None,
        _ => Some(name.to_string()),
    }
}
