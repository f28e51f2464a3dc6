//! Macro Expansion
//!
//! Best-effort textual expansion of macros used as the leading token of a
//! residual line. Anything that cannot be expanded is left as it was.

use mcmock_core::{DefinedSymbol, Warning};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::SymbolTable;
use crate::scanner::{matching_paren, split_top_level};

/// Bound on re-expanding the leading token of one line
const MAX_EXPANSION_DEPTH: usize = 16;

static RE_LEADING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*(\()?").unwrap());
static RE_BODY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(##|#)?(\s*)(\w+)").unwrap());
static RE_TOKEN_PASTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*##\s*").unwrap());

/// Rewritten residual lines
#[derive(Debug, Default)]
pub struct Expansion {
    pub lines: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// Expands macros with the symbols visible from one header
pub struct MacroExpander<'a> {
    symbols: SymbolTable<'a>,
}

impl<'a> MacroExpander<'a> {
    pub fn new(symbols: SymbolTable<'a>) -> Self {
        Self { symbols }
    }

    /// Expand every line; directive lines pass through untouched
    pub fn expand(&self, lines: &[String]) -> Expansion {
        let mut expansion = Expansion::default();
        for line in lines {
            let expanded = if line.starts_with('#') {
                line.clone()
            } else {
                self.expand_line(line, &mut expansion.warnings)
            };
            expansion.lines.push(expanded);
        }
        expansion
    }

    /// Expand the leading token of `line` until it is no longer a macro
    pub fn expand_line(&self, line: &str, warnings: &mut Vec<Warning>) -> String {
        let mut current = line.to_string();
        for _ in 0..MAX_EXPANSION_DEPTH {
            match self.expand_once(&current) {
                Ok(Some(expanded)) if expanded == current => break,
                Ok(Some(expanded)) => {
                    debug!("Expanded [{}] to [{}]", current, expanded);
                    current = expanded;
                }
                Ok(None) => break,
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                    break;
                }
            }
        }
        current
    }

    fn expand_once(&self, line: &str) -> Result<Option<String>, Warning> {
        let Some(caps) = RE_LEADING_TOKEN.captures(line) else {
            return Ok(None);
        };
        let name = &caps[1];
        let Some(symbol) = self.symbols.lookup(name) else {
            return Ok(None);
        };

        if symbol.is_function_like() {
            let Some(open) = caps.get(2).map(|m| m.start()) else {
                return Ok(None);
            };
            let unexpanded = || Warning::UnexpandedMacro {
                name: name.to_string(),
                line: line.to_string(),
            };
            let close = matching_paren(line, open).ok_or_else(unexpanded)?;
            let body = apply(symbol, &line[open + 1..close]).ok_or_else(unexpanded)?;
            Ok(Some(format!("{}{}", body, &line[close + 1..]).trim().to_string()))
        } else if !symbol.value.contains('(') {
            let rest = &line[caps.get(1).map_or(0, |m| m.end())..];
            Ok(Some(format!("{}{}", symbol.value, rest).trim().to_string()))
        } else {
            Ok(None)
        }
    }
}

/// Substitute `argument` into the body of a function-like macro
fn apply(symbol: &DefinedSymbol, argument: &str) -> Option<String> {
    let close = matching_paren(&symbol.value, 0)?;
    let params: Vec<&str> = split_top_level(&symbol.value[1..close], ',')
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    let body = symbol.value[close + 1..].trim();

    let args: Vec<&str> = match params.len() {
        0 if argument.trim().is_empty() => vec![],
        1 => vec![argument.trim()],
        _ => split_top_level(argument, ','),
    };
    if args.len() != params.len() {
        return None;
    }

    let substituted = RE_BODY_TOKEN.replace_all(body, |caps: &Captures| {
        let Some(idx) = params.iter().position(|p| *p == &caps[3]) else {
            return caps[0].to_string();
        };
        let arg = args[idx];
        match caps.get(1).map(|m| m.as_str()) {
            Some("#") => format!("\"{}\"", arg),
            Some(paste) => format!("{}{}{}", paste, &caps[2], arg),
            None => format!("{}{}", &caps[2], arg),
        }
    });
    Some(RE_TOKEN_PASTE.replace_all(&substituted, "").into_owned())
}
