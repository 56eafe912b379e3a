// newick.rs - Newick reader producing an unranked node list
//
// Grammar:
//   tree     = subtree ';'
//   subtree  = '(' children ')' label | label
//   children = subtree (',' subtree)*
//   label    = name? (':' length)?
//
// Bracketed comments (`[&rate=0.1]`) are skipped anywhere whitespace is
// allowed. Names may be single-quoted.

use crate::error::{Error, Result};

/// Parsed node; parents are always allocated before their children.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub name: Option<String>,
    pub length: Option<f64>,
}

impl RawNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Parse one Newick string. Returns the nodes; the root is index 0.
pub fn parse(input: &str) -> Result<Vec<RawNode>> {
    let mut parser = Parser::new(input.as_bytes());
    parser.parse_tree()?;
    Ok(parser.nodes)
}

/// Format a branch length with trailing zeros stripped.
pub fn format_length(length: f64) -> String {
    let s = format!("{:.10}", length);
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

/// Quote a taxon name when it contains Newick punctuation.
pub fn quote_name(name: &str) -> String {
    if name
        .chars()
        .any(|c| matches!(c, '(' | ')' | ',' | ':' | ';' | '[' | ']' | '\'') || c.is_whitespace())
    {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    nodes: Vec<RawNode>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            nodes: Vec::new(),
        }
    }

    fn parse_tree(&mut self) -> Result<()> {
        self.skip_whitespace()?;
        self.parse_subtree(None)?;
        self.skip_whitespace()?;
        if self.peek() != Some(b';') {
            return Err(Error::input("expected ';' at end of Newick string"));
        }
        self.pos += 1;
        Ok(())
    }

    fn parse_subtree(&mut self, parent: Option<usize>) -> Result<usize> {
        self.skip_whitespace()?;
        let id = self.alloc_node(parent);

        if self.peek() == Some(b'(') {
            self.pos += 1;
            let first = self.parse_subtree(Some(id))?;
            self.nodes[id].children.push(first);

            loop {
                self.skip_whitespace()?;
                if self.peek() == Some(b',') {
                    self.pos += 1;
                    let child = self.parse_subtree(Some(id))?;
                    self.nodes[id].children.push(child);
                } else {
                    break;
                }
            }
            self.skip_whitespace()?;
            if self.peek() != Some(b')') {
                return Err(Error::input(format!(
                    "expected ')' at position {} in Newick string",
                    self.pos
                )));
            }
            self.pos += 1;
        }

        self.parse_label(id)?;
        Ok(id)
    }

    fn parse_label(&mut self, id: usize) -> Result<()> {
        self.skip_whitespace()?;
        let name = if self.peek() == Some(b'\'') {
            self.parse_quoted()?
        } else {
            self.parse_name()
        };
        if !name.is_empty() {
            self.nodes[id].name = Some(name);
        }

        self.skip_whitespace()?;
        if self.peek() == Some(b':') {
            self.pos += 1;
            self.skip_whitespace()?;
            let len_str = self.parse_float_str();
            if len_str.is_empty() {
                return Err(Error::input("expected number after ':'"));
            }
            let len: f64 = len_str
                .parse()
                .map_err(|_| Error::input(format!("invalid branch length: '{}'", len_str)))?;
            self.nodes[id].length = Some(len);
        }
        Ok(())
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            match b {
                b':' | b',' | b')' | b'(' | b';' | b'[' => break,
                b' ' | b'\t' | b'\n' | b'\r' => break,
                _ => self.pos += 1,
            }
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.pos += 1;
        let mut name = Vec::new();
        loop {
            match self.peek() {
                None => return Err(Error::input("unterminated quoted name")),
                Some(b'\'') if self.input.get(self.pos + 1) == Some(&b'\'') => {
                    name.push(b'\'');
                    self.pos += 2;
                }
                Some(b'\'') => {
                    self.pos += 1;
                    break;
                }
                Some(b) => {
                    name.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&name).into_owned())
    }

    fn parse_float_str(&mut self) -> String {
        let start = self.pos;
        while let Some(b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E') = self.peek() {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn alloc_node(&mut self, parent: Option<usize>) -> usize {
        self.nodes.push(RawNode {
            parent,
            children: Vec::new(),
            name: None,
            length: None,
        });
        self.nodes.len() - 1
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'[' => {
                    let close = self.input[self.pos..]
                        .iter()
                        .position(|&c| c == b']')
                        .ok_or_else(|| Error::input("unterminated '[' comment"))?;
                    self.pos += close + 1;
                }
                _ => break,
            }
        }
        Ok(())
    }
}
