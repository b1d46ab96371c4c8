use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

use crate::grammars;

/// A Go source file together with its concrete syntax tree
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
}

impl ParsedFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// True if tree-sitter had to recover from a syntax error anywhere
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }
}

/// Reusable Go parser
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&grammars::language_go())
            .map_err(|e| anyhow!("Failed to load Go grammar: {}", e))?;
        Ok(Self { parser })
    }

    /// Parse source text that was already read from `path`
    pub fn parse(&mut self, path: impl Into<PathBuf>, source: String) -> Result<ParsedFile> {
        let path = path.into();
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| anyhow!("Failed to parse {}", path.display()))?;
        Ok(ParsedFile { path, source, tree })
    }

    /// Read and parse a file from disk
    pub fn parse_file(&mut self, path: &Path) -> Result<ParsedFile> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.parse(path, source)
    }
}
