//! Position helpers over tree-sitter nodes.
//!
//! Lines and columns are 1-based. Columns count bytes, so a tab is one
//! column. The end of a node is the position just past its last byte.

use tree_sitter::Node;

/// 1-based line/column pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

pub fn start_pos(node: Node<'_>) -> Pos {
    let p = node.start_position();
    Pos::new(p.row + 1, p.column + 1)
}

pub fn end_pos(node: Node<'_>) -> Pos {
    let p = node.end_position();
    Pos::new(p.row + 1, p.column + 1)
}

/// True when `pos` lies within `[start, end]` of `node`, both ends inclusive
pub fn encloses(node: Node<'_>, pos: Pos) -> bool {
    let start = start_pos(node);
    let end = end_pos(node);
    !(pos.line < start.line
        || pos.line > end.line
        || (pos.line == start.line && pos.column < start.column)
        || (pos.line == end.line && pos.column > end.column))
}

/// Find the first node in depth-first pre-order that encloses `pos` and
/// satisfies `wanted`.
///
/// Subtrees that do not enclose `pos` are skipped entirely. Comments are
/// never candidates.
pub fn node_at<'t, F>(root: Node<'t>, pos: Pos, wanted: F) -> Option<Node<'t>>
where
    F: Fn(Node<'t>) -> bool,
{
    fn visit<'t, F: Fn(Node<'t>) -> bool>(node: Node<'t>, pos: Pos, wanted: &F) -> Option<Node<'t>> {
        if node.is_extra() || !encloses(node, pos) {
            return None;
        }
        if wanted(node) {
            return Some(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if let Some(found) = visit(child, pos, wanted) {
                return Some(found);
            }
        }
        None
    }
    visit(root, pos, &wanted)
}

/// Ancestors of `node` ordered from the root down to the immediate parent
pub fn ancestors(node: Node<'_>) -> Vec<Node<'_>> {
    let mut chain = Vec::new();
    let mut current = node.parent();
    while let Some(n) = current {
        chain.push(n);
        current = n.parent();
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GoParser;

    #[test]
    fn test_node_at_finds_identifier() {
        let mut parser = GoParser::new().unwrap();
        let file = parser
            .parse("x.go", "package x\n\nvar answer = 42\n".to_string())
            .unwrap();
        let node = node_at(file.root(), Pos::new(3, 6), |n| n.kind() == "identifier").unwrap();
        assert_eq!(file.text(node), "answer");
        assert_eq!(start_pos(node), Pos::new(3, 5));
        assert_eq!(end_pos(node), Pos::new(3, 11));
    }

    #[test]
    fn test_node_at_end_column_is_inclusive() {
        let mut parser = GoParser::new().unwrap();
        let file = parser
            .parse("x.go", "package x\n\nvar answer = 42\n".to_string())
            .unwrap();
        // Column 11 is the space just after "answer".
        let node = node_at(file.root(), Pos::new(3, 11), |n| n.kind() == "identifier").unwrap();
        assert_eq!(file.text(node), "answer");
    }

    #[test]
    fn test_node_at_literal_has_no_identifier() {
        let mut parser = GoParser::new().unwrap();
        let file = parser
            .parse("x.go", "package x\n\nvar answer = 42\n".to_string())
            .unwrap();
        assert!(node_at(file.root(), Pos::new(3, 15), |n| n.kind() == "identifier").is_none());
    }
}
