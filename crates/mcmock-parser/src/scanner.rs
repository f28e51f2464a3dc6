//! Depth-tracking character scanner
//!
//! Every bracket-sensitive pass of the parser (statement splitting, typedef
//! accumulation, parameter splitting, parameter list extraction) walks text
//! through [`DepthScanner`], which reports the bracket depth in effect before
//! each character.

use std::str::CharIndices;

/// Bracket nesting depth
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Depth {
    pub paren: i32,
    pub brace: i32,
}

impl Depth {
    /// Account for one character
    pub fn feed(&mut self, c: char) {
        match c {
            '(' => self.paren += 1,
            ')' => self.paren -= 1,
            '{' => self.brace += 1,
            '}' => self.brace -= 1,
            _ => {}
        }
    }

    /// Account for every character of `text`
    pub fn feed_str(&mut self, text: &str) {
        text.chars().for_each(|c| self.feed(c));
    }

    /// Outside of any parenthesis or brace
    pub fn is_top_level(&self) -> bool {
        self.paren <= 0 && self.brace <= 0
    }
}

/// One scanned character together with the depth in effect before it
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub index: usize,
    pub ch: char,
    pub depth: Depth,
}

/// Cursor over the characters of a string that tracks bracket depth
pub struct DepthScanner<'a> {
    chars: CharIndices<'a>,
    depth: Depth,
}

impl<'a> DepthScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices(),
            depth: Depth::default(),
        }
    }
}

impl Iterator for DepthScanner<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        let (index, ch) = self.chars.next()?;
        let step = Step {
            index,
            ch,
            depth: self.depth,
        };
        self.depth.feed(ch);
        Some(step)
    }
}

/// Byte index of the first `target` outside of any bracket
pub fn find_top_level(text: &str, target: char) -> Option<usize> {
    DepthScanner::new(text)
        .find(|step| step.ch == target && step.depth.is_top_level())
        .map(|step| step.index)
}

/// Byte index of the `)` closing the `(` at `open`
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let rest = text.get(open..)?;
    if !rest.starts_with('(') {
        return None;
    }
    DepthScanner::new(rest)
        .skip(1)
        .find(|step| step.ch == ')' && step.depth.paren == 1)
        .map(|step| open + step.index)
}

/// Split at every `separator` outside of any bracket
///
/// Segments are trimmed; empty segments are kept so callers can reject them.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    for step in DepthScanner::new(text) {
        if step.ch == separator && step.depth.is_top_level() {
            segments.push(text[start..step.index].trim());
            start = step.index + step.ch.len_utf8();
        }
    }
    segments.push(text[start..].trim());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level_keeps_nested_commas() {
        let parts = split_top_level("int a, void (*cb)(int, char), char * b", ',');
        assert_eq!(parts, vec!["int a", "void (*cb)(int, char)", "char * b"]);
    }

    #[test]
    fn test_split_top_level_reports_empty_segments() {
        assert_eq!(split_top_level("int a,", ','), vec!["int a", ""]);
    }

    #[test]
    fn test_matching_paren() {
        let text = "foo(int (*cb)(int), char c);";
        let open = text.find('(').unwrap();
        let close = matching_paren(text, open).unwrap();
        assert_eq!(&text[open + 1..close], "int (*cb)(int), char c");
        assert_eq!(matching_paren("foo(int", 3), None);
    }

    #[test]
    fn test_find_top_level_skips_braces() {
        assert_eq!(find_top_level("struct s { int (*f)(int); };", '('), None);
        assert_eq!(find_top_level("int foo(void);", '('), Some(7));
    }

    #[test]
    fn test_depth_across_lines() {
        let mut depth = Depth::default();
        depth.feed_str("typedef struct {");
        assert!(!depth.is_top_level());
        depth.feed_str("int a; } s_t;");
        assert!(depth.is_top_level());
    }
}
