//! Go syntax: owned AST, lowering from tree-sitter, and body stripping.

pub mod ast;
mod lower;
mod strip;

pub use lower::lower;
pub use strip::{strip_bodies, BodyFilter};

/// Exported per Go's rule: the name starts with an upper-case letter
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
