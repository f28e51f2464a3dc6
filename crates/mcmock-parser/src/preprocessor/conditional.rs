//! Conditional Block Stripping
//!
//! Removes lines guarded by conditional directives whose condition does not
//! hold for the symbols visible from the header. Conditions are decided by
//! symbol presence only; expressions are never evaluated.

use mcmock_core::{Error, Result};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

use super::SymbolTable;

static RE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*(ifdef|ifndef|if|elif|else|endif)\b\s*(.*)$").unwrap()
});
static RE_DEFINED_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s(]*(!)?[\s(]*defined[\s(]*(\w+)[\s)]*$").unwrap()
});
static RE_FORWARD_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^struct\s+\w+\s*;$").unwrap());
static RE_DEFINE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s*define\b").unwrap());

/// A conditional compilation directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'l> {
    If(&'l str),
    Ifdef(&'l str),
    Ifndef(&'l str),
    Elif(&'l str),
    Else,
    Endif,
}

impl<'l> Directive<'l> {
    pub fn parse(line: &'l str) -> Option<Self> {
        let caps = RE_DIRECTIVE.captures(line)?;
        let argument = caps.get(2).map_or("", |m| m.as_str().trim());
        let directive = match &caps[1] {
            "ifdef" => Directive::Ifdef(argument),
            "ifndef" => Directive::Ifndef(argument),
            "if" => Directive::If(argument),
            "elif" => Directive::Elif(argument),
            "else" => Directive::Else,
            _ => Directive::Endif,
        };
        Some(directive)
    }

    /// `#if`, `#ifdef` and `#ifndef` open a nested block
    pub fn opens_nested(&self) -> bool {
        matches!(
            self,
            Directive::If(_) | Directive::Ifdef(_) | Directive::Ifndef(_)
        )
    }

    /// Directives the stripper treats as the start of a protected block
    pub fn opens_block(&self) -> bool {
        self.opens_nested() || matches!(self, Directive::Elif(_))
    }
}

/// Symbol a clause tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Named(String),
    /// `#if 0`; never defined
    Never,
}

/// One presence test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Holds when the symbol is absent
    pub negated: bool,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

/// Clauses folded left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub first: Clause,
    pub rest: Vec<(Operator, Clause)>,
}

impl Condition {
    /// Condition of an opening or `#elif` directive found on `line`
    pub fn parse(directive: &Directive<'_>, line: &str) -> Result<Self> {
        let fail = || Error::Conditional(line.to_string());
        let expression = match *directive {
            Directive::Ifdef(name) | Directive::Ifndef(name) => {
                let name = name.split_whitespace().next().ok_or_else(fail)?;
                return Ok(Self {
                    first: Clause {
                        negated: matches!(directive, Directive::Ifndef(_)),
                        symbol: Symbol::Named(name.to_string()),
                    },
                    rest: vec![],
                });
            }
            Directive::If(expression) | Directive::Elif(expression) => expression,
            Directive::Else | Directive::Endif => return Err(fail()),
        };

        let mut clauses = split_clauses(expression).into_iter();
        let (_, first) = clauses.next().ok_or_else(fail)?;
        let first = parse_clause(first).ok_or_else(fail)?;
        let mut rest = Vec::new();
        for (op, text) in clauses {
            rest.push((op, parse_clause(text).ok_or_else(fail)?));
        }
        Ok(Self { first, rest })
    }
}

/// Split at every `&&` and `||`
///
/// The operator paired with the first clause is a placeholder.
fn split_clauses(expression: &str) -> Vec<(Operator, &str)> {
    let mut clauses = Vec::new();
    let mut operator = Operator::And;
    let mut rest = expression;
    loop {
        let next = [("&&", Operator::And), ("||", Operator::Or)]
            .into_iter()
            .filter_map(|(token, op)| rest.find(token).map(|idx| (idx, op)))
            .min_by_key(|(idx, _)| *idx);
        match next {
            Some((idx, op)) => {
                clauses.push((operator, &rest[..idx]));
                operator = op;
                rest = &rest[idx + 2..];
            }
            None => {
                clauses.push((operator, rest));
                return clauses;
            }
        }
    }
}

/// `defined(NAME)`, `!defined(NAME)`, `0`, or any other text taken literally
fn parse_clause(text: &str) -> Option<Clause> {
    if let Some(caps) = RE_DEFINED_CLAUSE.captures(text) {
        return Some(Clause {
            negated: caps.get(1).is_some(),
            symbol: Symbol::Named(caps[2].to_string()),
        });
    }

    let literal = text.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
    let symbol = match literal {
        "" => return None,
        "0" => Symbol::Never,
        _ => Symbol::Named(literal.to_string()),
    };
    Some(Clause {
        negated: false,
        symbol,
    })
}

/// One branch of a conditional block
#[derive(Debug)]
struct Branch {
    /// Line index of the opening, `#elif` or `#else` directive
    directive: usize,
    /// Lines belonging to the branch, directives excluded
    body: Range<usize>,
}

/// A conditional block from its opening directive to its `#endif`
#[derive(Debug)]
struct Block {
    branches: Vec<Branch>,
    end: usize,
}

impl Block {
    fn locate(lines: &[String], start: usize) -> Result<Self> {
        let mut branches = Vec::new();
        let mut branch_start = start;
        let mut depth = 0usize;

        for (idx, line) in lines.iter().enumerate().skip(start + 1) {
            let Some(directive) = Directive::parse(line) else {
                continue;
            };
            match directive {
                d if d.opens_nested() => depth += 1,
                Directive::Endif if depth > 0 => depth -= 1,
                Directive::Endif => {
                    branches.push(Branch {
                        directive: branch_start,
                        body: branch_start + 1..idx,
                    });
                    return Ok(Self { branches, end: idx });
                }
                Directive::Elif(_) | Directive::Else if depth == 0 => {
                    branches.push(Branch {
                        directive: branch_start,
                        body: branch_start + 1..idx,
                    });
                    branch_start = idx;
                }
                _ => {}
            }
        }

        Err(Error::Conditional(lines[start].clone()))
    }
}

/// Strips lines excluded by conditional directives
pub struct ConditionalStripper<'a> {
    symbols: SymbolTable<'a>,
}

impl<'a> ConditionalStripper<'a> {
    pub fn new(symbols: SymbolTable<'a>) -> Self {
        Self { symbols }
    }

    /// Strip every conditional block, then tidy the remaining lines
    pub fn strip(&self, mut lines: Vec<String>) -> Result<Vec<String>> {
        let mut passes = 0;
        while lines.iter().any(|line| opens_block(line)) {
            lines = self.strip_pass(&lines)?;
            passes += 1;
        }
        debug!("Stripped conditional blocks in {} passes", passes);

        let lines = strip_forward_declarations(lines);
        let lines = join_continued_lines(lines);
        Ok(strip_defines(lines))
    }

    /// Resolve every outermost block once
    fn strip_pass(&self, lines: &[String]) -> Result<Vec<String>> {
        let mut kept = Vec::with_capacity(lines.len());
        let mut idx = 0;
        while idx < lines.len() {
            if !opens_block(&lines[idx]) {
                kept.push(lines[idx].clone());
                idx += 1;
                continue;
            }

            let block = Block::locate(lines, idx)?;
            if let Some(body) = self.select_branch(lines, &block)? {
                kept.extend_from_slice(&lines[body]);
            }
            idx = block.end + 1;
        }
        Ok(kept)
    }

    /// Body of the first branch whose condition holds
    fn select_branch(&self, lines: &[String], block: &Block) -> Result<Option<Range<usize>>> {
        for branch in &block.branches {
            let line = &lines[branch.directive];
            let directive =
                Directive::parse(line).ok_or_else(|| Error::Conditional(line.clone()))?;
            if directive == Directive::Else {
                return Ok(Some(branch.body.clone()));
            }
            let condition = Condition::parse(&directive, line)?;
            if self.holds(&condition, &lines[branch.body.clone()]) {
                debug!("Keeping branch [{}]", line);
                return Ok(Some(branch.body.clone()));
            }
        }
        Ok(None)
    }

    /// Fold the clauses of `condition` left to right
    pub fn holds(&self, condition: &Condition, body: &[String]) -> bool {
        condition
            .rest
            .iter()
            .fold(self.clause_holds(&condition.first, body), |acc, (op, clause)| {
                let value = self.clause_holds(clause, body);
                match op {
                    Operator::And => acc && value,
                    Operator::Or => acc || value,
                }
            })
    }

    fn clause_holds(&self, clause: &Clause, body: &[String]) -> bool {
        let name = match &clause.symbol {
            Symbol::Never => return clause.negated,
            Symbol::Named(name) => name,
        };
        match (clause.negated, self.symbols.is_defined(name)) {
            (false, defined) => defined,
            (true, false) => true,
            // An include guard defines its own symbol inside the block
            (true, true) => defines_symbol(body, name),
        }
    }
}

fn opens_block(line: &str) -> bool {
    Directive::parse(line).is_some_and(|d| d.opens_block())
}

/// Whether `body` carries a top-level `#define name`
fn defines_symbol(body: &[String], name: &str) -> bool {
    let mut depth = 0usize;
    for line in body {
        match Directive::parse(line) {
            Some(d) if d.opens_nested() => depth += 1,
            Some(Directive::Endif) => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                let defined = line
                    .strip_prefix('#')
                    .map(str::trim_start)
                    .and_then(|rest| rest.strip_prefix("define"))
                    .and_then(|rest| rest.split_whitespace().next());
                if defined.map(|d| d.split('(').next() == Some(name)) == Some(true) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Drop empty forward declarations such as `struct Name;`
fn strip_forward_declarations(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| !RE_FORWARD_DECLARATION.is_match(line))
        .collect()
}

/// Join lines ending in a backslash with the line that follows
fn join_continued_lines(lines: Vec<String>) -> Vec<String> {
    let mut joined: Vec<String> = Vec::with_capacity(lines.len());
    let mut pending: Option<String> = None;
    for line in lines {
        let mut text = match pending.take() {
            Some(mut text) => {
                text.push(' ');
                text.push_str(&line);
                text
            }
            None => line,
        };
        if text.ends_with('\\') {
            text.pop();
            pending = Some(text.trim_end().to_string());
        } else {
            joined.push(text);
        }
    }
    joined.extend(pending);
    joined
}

fn strip_defines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| !RE_DEFINE_LINE.is_match(line))
        .collect()
}
