//! Human readable context for a reference: which declaration it sits in.

use spelunk_metal::{ancestors, ParsedFile};
use tree_sitter::Node;

use super::position::receiver_type_name;

fn covers(node: Node<'_>, offset: usize) -> bool {
    node.start_byte() <= offset && offset <= node.end_byte()
}

fn field_covers(node: Node<'_>, field: &str, offset: usize) -> bool {
    node.child_by_field_name(field).is_some_and(|n| covers(n, offset))
}

/// Whether `offset` falls inside one of the result fields of a function
/// or function type node
fn in_results(node: Node<'_>, offset: usize) -> bool {
    let Some(result) = node.child_by_field_name("result") else {
        return false;
    };
    if result.kind() != "parameter_list" {
        return covers(result, offset);
    }
    let mut cursor = result.walk();
    let found = result
        .named_children(&mut cursor)
        .any(|field| covers(field, offset));
    found
}

fn value_spec_label(parsed: &ParsedFile, spec: Node<'_>, ident: &str) -> String {
    let mut cursor = spec.walk();
    let names: Vec<&str> = spec
        .children_by_field_name("name", &mut cursor)
        .map(|n| parsed.text(n))
        .collect();
    format!("{} in declaration of {}", ident, names.join(", "))
}

fn func_label(parsed: &ParsedFile, decl: Node<'_>, offset: usize, ident: &str) -> Option<String> {
    let name = parsed.text(decl.child_by_field_name("name")?);
    let func = match decl
        .child_by_field_name("receiver")
        .and_then(|r| receiver_type_name(parsed, r))
    {
        Some(recv) => format!("{}.{}", recv, name),
        None => name.to_string(),
    };

    if field_covers(decl, "body", offset) {
        Some(format!("{} in {}() body", ident, func))
    } else if field_covers(decl, "parameters", offset) {
        Some(format!("{} in {}() params", ident, func))
    } else if field_covers(decl, "receiver", offset) {
        Some(format!("receiver in {}()", func))
    } else if in_results(decl, offset) {
        Some(format!("{} returned by {}()", ident, func))
    } else {
        None
    }
}

fn type_spec_label(parsed: &ParsedFile, spec: Node<'_>, offset: usize, ident: &str) -> Option<String> {
    let name = parsed.text(spec.child_by_field_name("name")?);
    let ty = spec.child_by_field_name("type")?;
    match ty.kind() {
        "struct_type" => {
            let mut cursor = ty.walk();
            let list = ty
                .named_children(&mut cursor)
                .find(|c| c.kind() == "field_declaration_list")?;
            let mut cursor = list.walk();
            let field = list
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "field_declaration")
                .find(|c| covers(*c, offset))?;
            let embedded = field.child_by_field_name("name").is_none();
            embedded.then(|| format!("{} embedded in struct {}", ident, name))
        }
        "function_type" => {
            if field_covers(ty, "parameters", offset) {
                Some(format!("{} in params for func type {}", ident, name))
            } else if in_results(ty, offset) {
                Some(format!("{} returned by func type {}", ident, name))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Label for the identifier `ident` starting at byte `offset`.
///
/// The outermost enclosing value spec or function declaration decides the
/// label; type specs only label embedded fields and function type
/// signatures. Anything else is labelled with the bare identifier.
pub fn reference_label(parsed: &ParsedFile, offset: usize, ident: &str) -> String {
    let Some(leaf) = parsed.root().descendant_for_byte_range(offset, offset) else {
        return ident.to_string();
    };
    let mut label = None;
    for node in ancestors(leaf) {
        match node.kind() {
            "var_spec" | "const_spec" => return value_spec_label(parsed, node, ident),
            "function_declaration" | "method_declaration" => {
                return func_label(parsed, node, offset, ident).unwrap_or_else(|| ident.to_string());
            }
            "type_spec" | "type_alias" => {
                if let Some(l) = type_spec_label(parsed, node, offset, ident) {
                    label = Some(l);
                }
            }
            _ => {}
        }
    }
    label.unwrap_or_else(|| ident.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelunk_metal::GoParser;

    const SRC: &str = "package p

type Item struct {
	Name string
	Base
}

type Visit func(i Item) Item

var first, second = Item{}, Item{}

func (s *Store) Put(i Item) Item {
	var x Item
	return x
}

func Make() (out Item) {
	return
}
";

    fn label_at(needle: &str, nth: usize) -> String {
        let file = GoParser::new().unwrap().parse("/m/p.go", SRC.to_string()).unwrap();
        let offset = SRC.match_indices(needle).nth(nth).unwrap().0;
        reference_label(&file, offset, needle)
    }

    #[test]
    fn test_value_spec_label_lists_all_names() {
        assert_eq!(label_at("Item", 4), "Item in declaration of first, second");
        assert_eq!(label_at("Item", 3), "Item in declaration of first, second");
    }

    #[test]
    fn test_function_labels() {
        assert_eq!(label_at("Store", 0), "receiver in Store.Put()");
        assert_eq!(label_at("Item", 5), "Item in Store.Put() params");
        assert_eq!(label_at("Item", 6), "Item returned by Store.Put()");
        assert_eq!(label_at("Item", 7), "Item in Store.Put() body");
        assert_eq!(label_at("Item", 8), "Item returned by Make()");
    }

    #[test]
    fn test_embedded_field_label_checks_the_enclosing_field() {
        assert_eq!(label_at("Base", 0), "Base embedded in struct Item");
        // A named field is not labelled even though it precedes the embedding.
        assert_eq!(label_at("string", 0), "string");
    }

    #[test]
    fn test_func_type_labels() {
        assert_eq!(label_at("Item", 1), "Item in params for func type Visit");
        assert_eq!(label_at("Item", 2), "Item returned by func type Visit");
    }
}
