//! Declaration parser
//!
//! Turns the stripped residual lines of a header into [`Function`]s. Only
//! statements with a top-level parameter list are modelled; every other
//! statement is discarded.

use mcmock_core::{Error, Function, FunctionPointer, Parameter, ParameterKind, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::scanner::{find_top_level, matching_paren, split_top_level, Depth};

/// Name given to a variadic parameter so its ignore API has something to scope to
pub const VARIADIC_NAME: &str = "variable_list";
/// Type text of a variadic parameter
pub const VARIADIC_TYPE: &str = "...";

static RE_EXTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bextern\b").unwrap());
static RE_POINTER_SPACING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\*").unwrap());
static RE_FUNCTION_POINTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.+?)\s*\(\s*\*\s*(\w+)\s*\)\s*\((.*)\)\s*$").unwrap()
});

/// Classify one raw parameter
///
/// Checked in priority order: an inline function pointer, a typedef'd
/// callback, a pointer (output when its name contains `out_`), a variadic
/// argument, then a plain value.
pub fn classify_parameter(text: &str) -> ParameterKind {
    if text.contains('(') {
        ParameterKind::FunctionPointer
    } else if text.contains("callback") {
        ParameterKind::Callback
    } else if text.contains('*') {
        match split_declarator(text) {
            Some((_, name)) if name.contains("out_") => ParameterKind::OutPointer,
            _ => ParameterKind::InPointer,
        }
    } else if text.contains("...") || text.contains("va_list") {
        ParameterKind::Variadic
    } else {
        ParameterKind::Value
    }
}

/// Decompose `ret (*name)(params)`
pub fn parse_function_pointer(text: &str) -> Result<FunctionPointer> {
    let caps = RE_FUNCTION_POINTER
        .captures(text)
        .ok_or_else(|| Error::FunctionPointer(text.to_string()))?;
    Ok(FunctionPointer {
        return_type: caps[1].to_string(),
        name: caps[2].to_string(),
        params: caps[3].trim().to_string(),
    })
}

/// Collapse whitespace and attach `*` to the preceding token
fn normalize_type(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    RE_POINTER_SPACING.replace_all(&collapsed, "*").into_owned()
}

/// Split `type name` into type and name
///
/// `*`s leading the name move onto the type. `None` when there is only one
/// token.
fn split_declarator(text: &str) -> Option<(String, String)> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let raw_name = tokens.pop()?;
    let stars = raw_name.len() - raw_name.trim_start_matches('*').len();
    let name = raw_name.replace('*', "");
    let type_name = format!("{}{}", tokens.join(" "), "*".repeat(stars));
    Some((normalize_type(&type_name), name))
}

/// Suffix for the n-th synthesized name: a..z, aa, ab, ...
fn letter_suffix(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Parses function declarations out of stripped header lines
///
/// Synthesized parameter names draw from a counter owned by the parser, so
/// one parser is used per header.
#[derive(Debug, Default)]
pub struct DeclarationParser {
    synthesized: usize,
}

impl DeclarationParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every function declaration in `lines`
    pub fn parse(&mut self, lines: &[String]) -> Result<Vec<Function>> {
        let merged = merge_brace_blocks(lines);
        let mut functions = Vec::new();
        for statement in join_statements(merged) {
            if statement.starts_with('#') {
                trace!("Skipping directive [{}]", statement);
                continue;
            }
            if let Some(function) = self.parse_statement(&statement)? {
                functions.push(function);
            }
        }
        debug!("Parsed {} function declarations", functions.len());
        Ok(functions)
    }

    /// Parse one statement; `None` when it declares no function
    pub fn parse_statement(&mut self, statement: &str) -> Result<Option<Function>> {
        let Some(open) = find_top_level(statement, '(') else {
            trace!("Discarding [{}]", statement);
            return Ok(None);
        };

        let (name, return_type) = split_name(statement, &statement[..open])?;
        let close = matching_paren(statement, open)
            .ok_or_else(|| Error::Declaration(statement.to_string()))?;
        let params = self.parse_parameters(&name, &statement[open + 1..close])?;

        Ok(Some(Function::new(name, return_type, params)))
    }

    fn parse_parameters(&mut self, function: &str, interior: &str) -> Result<Vec<Parameter>> {
        if interior.trim().is_empty() {
            return Ok(vec![]);
        }

        let mut params = Vec::new();
        for text in split_top_level(interior, ',') {
            if text.is_empty() {
                return Err(Error::Parameter {
                    function: function.to_string(),
                    parameter: interior.to_string(),
                });
            }
            if text == "void" {
                continue;
            }
            params.push(self.parse_parameter(text)?);
        }
        Ok(params)
    }

    /// Parse one parameter of a parameter list
    pub fn parse_parameter(&mut self, text: &str) -> Result<Parameter> {
        let kind = classify_parameter(text);
        let parameter = match kind {
            ParameterKind::FunctionPointer => {
                Parameter::function_pointer(text, parse_function_pointer(text)?)
            }
            ParameterKind::Variadic => Parameter::new(kind, VARIADIC_TYPE, VARIADIC_NAME),
            _ => match split_declarator(text) {
                Some((type_name, name)) => Parameter::new(kind, type_name, name),
                None => {
                    let type_name = normalize_type(text);
                    let name = self.synthesize_name(&type_name);
                    Parameter::new(kind, type_name, name)
                }
            },
        };
        trace!("Parameter [{}] is {:?}", text, parameter.kind);
        Ok(parameter)
    }

    /// Name for a parameter declared by type only
    fn synthesize_name(&mut self, type_name: &str) -> String {
        let ident: String = type_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        let name = format!("arg_{}_{}", ident, letter_suffix(self.synthesized));
        self.synthesized += 1;
        name
    }
}

/// Name and return type from the text before the parameter list
fn split_name(statement: &str, head: &str) -> Result<(String, String)> {
    let head = RE_EXTERN.replace_all(head, " ");
    let mut tokens: Vec<&str> = head.split_whitespace().collect();
    let raw_name = tokens.pop().unwrap_or_default();
    let stars = raw_name.matches('*').count();
    let name = raw_name.replace('*', "");
    let return_type = format!("{}{}", tokens.join(" "), "*".repeat(stars));
    let return_type = normalize_type(&return_type);

    if name.is_empty() || return_type.is_empty() {
        return Err(Error::Declaration(statement.to_string()));
    }
    Ok((name, return_type))
}

/// Join lines until their braces balance
fn merge_brace_blocks(lines: &[String]) -> Vec<String> {
    let mut merged = Vec::with_capacity(lines.len());
    let mut pending: Option<(String, Depth)> = None;

    for line in lines {
        let (text, depth) = match pending.take() {
            Some((mut text, mut depth)) => {
                text.push(' ');
                text.push_str(line);
                depth.feed_str(line);
                (text, depth)
            }
            None => {
                let mut depth = Depth::default();
                depth.feed_str(line);
                (line.clone(), depth)
            }
        };
        if depth.brace > 0 {
            pending = Some((text, depth));
        } else {
            merged.push(text);
        }
    }

    merged.extend(pending.map(|(text, _)| text));
    merged
}

/// Join non-directive lines into `;`-terminated statements
fn join_statements(lines: Vec<String>) -> Vec<String> {
    let mut statements = Vec::with_capacity(lines.len());
    let mut pending = String::new();

    for line in lines {
        if line.starts_with('#') {
            statements.push(line);
            continue;
        }
        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(&line);
        if line.contains(';') {
            statements.push(std::mem::take(&mut pending));
        }
    }

    if !pending.is_empty() {
        debug!("Dropping unterminated statement [{}]", pending);
    }
    statements
}
