//! Locating syntax nodes by file position.

use spelunk_metal::{is_identifier, node_at, start_pos, ParsedFile, Pos};
use tree_sitter::Node;

use crate::loc::FileLoc;
use crate::types::{FileId, Program};

/// An identifier occurrence copied out of the concrete tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentAt {
    pub name: String,
    /// Byte offset of the first character
    pub offset: usize,
    pub loc: FileLoc,
}

impl IdentAt {
    fn from_node(parsed: &ParsedFile, node: Node<'_>) -> Self {
        Self {
            name: parsed.text(node).to_string(),
            offset: node.start_byte(),
            loc: FileLoc::at(&parsed.path, start_pos(node)),
        }
    }
}

/// First node in depth-first order that encloses `pos` and has one of
/// `kinds`
pub fn find_node_at<'t>(parsed: &'t ParsedFile, pos: Pos, kinds: &[&str]) -> Option<Node<'t>> {
    node_at(parsed.root(), pos, |n| kinds.contains(&n.kind()))
}

fn parsed(program: &Program, file: FileId) -> Option<&ParsedFile> {
    program.file(file).parsed.as_ref()
}

/// The identifier at `pos`, if any
pub fn ident_at(program: &Program, file: FileId, pos: Pos) -> Option<IdentAt> {
    let parsed = parsed(program, file)?;
    let node = node_at(parsed.root(), pos, |n| is_identifier(n.kind()))?;
    Some(IdentAt::from_node(parsed, node))
}

/// Name of the type spec enclosing `pos`
pub fn type_spec_name_at(program: &Program, file: FileId, pos: Pos) -> Option<IdentAt> {
    let parsed = parsed(program, file)?;
    let spec = find_node_at(parsed, pos, &["type_spec", "type_alias"])?;
    let name = spec.child_by_field_name("name")?;
    Some(IdentAt::from_node(parsed, name))
}

/// A function declaration enclosing a position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuncAt {
    Func { name: IdentAt },
    Method { name: IdentAt, receiver: String },
}

/// The function or method declaration enclosing `pos`
pub fn func_decl_at(program: &Program, file: FileId, pos: Pos) -> Option<FuncAt> {
    let parsed = parsed(program, file)?;
    let decl = find_node_at(parsed, pos, &["function_declaration", "method_declaration"])?;
    let name = IdentAt::from_node(parsed, decl.child_by_field_name("name")?);
    if decl.kind() == "function_declaration" {
        return Some(FuncAt::Func { name });
    }
    let receiver = decl
        .child_by_field_name("receiver")
        .and_then(|list| receiver_type_name(parsed, list))?;
    Some(FuncAt::Method { name, receiver })
}

/// Base type name of a receiver list: `T` for `(x T)`, `(*T)`, `(x *T[K])`
pub fn receiver_type_name(parsed: &ParsedFile, receiver_list: Node<'_>) -> Option<String> {
    let mut cursor = receiver_list.walk();
    let param = receiver_list
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let mut ty = param.child_by_field_name("type")?;
    loop {
        match ty.kind() {
            "type_identifier" => return Some(parsed.text(ty).to_string()),
            "pointer_type" | "parenthesized_type" => ty = ty.named_child(0)?,
            "generic_type" => ty = ty.child_by_field_name("type")?,
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelunk_metal::GoParser;

    fn parse(src: &str) -> ParsedFile {
        GoParser::new().unwrap().parse("/m/x.go", src.to_string()).unwrap()
    }

    #[test]
    fn test_find_node_at_type_spec() {
        let file = parse("package x\n\ntype Shape interface {\n\tArea() float64\n}\n");
        let spec = find_node_at(&file, Pos::new(4, 3), &["type_spec"]).unwrap();
        let name = spec.child_by_field_name("name").unwrap();
        assert_eq!(file.text(name), "Shape");
    }

    #[test]
    fn test_find_node_at_outside_declaration() {
        let file = parse("package x\n\ntype Shape interface{}\n\nvar y = 1\n");
        assert!(find_node_at(&file, Pos::new(5, 5), &["type_spec"]).is_none());
    }

    #[test]
    fn test_receiver_type_name_forms() {
        let file = parse(
            "package x\n\nfunc (s *Box) A() {}\nfunc (Box) B() {}\nfunc (l *List[T]) C() {}\n",
        );
        let names: Vec<Option<String>> = (3..=5)
            .map(|line| {
                let decl = find_node_at(&file, Pos::new(line, 1), &["method_declaration"]).unwrap();
                receiver_type_name(&file, decl.child_by_field_name("receiver").unwrap())
            })
            .collect();
        assert_eq!(
            names,
            vec![Some("Box".to_string()), Some("Box".to_string()), Some("List".to_string())]
        );
    }
}
