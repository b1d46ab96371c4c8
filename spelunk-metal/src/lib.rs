//! Syntax layer for spelunk.
//!
//! Wraps the tree-sitter Go grammar and exposes the small amount of
//! concrete-syntax machinery the analysis crate needs: parsing a file,
//! converting tree-sitter points into 1-based line/column positions, and
//! locating nodes by position.

pub mod grammars;
pub mod parser;
pub mod position;

pub use parser::{GoParser, ParsedFile};
pub use position::{ancestors, encloses, end_pos, node_at, start_pos, Pos};

/// Node kinds that denote an identifier occurrence in the Go grammar.
pub const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "field_identifier",
    "package_identifier",
    "label_name",
    "blank_identifier",
];

/// True for any identifier-like leaf.
pub fn is_identifier(kind: &str) -> bool {
    IDENTIFIER_KINDS.contains(&kind)
}
