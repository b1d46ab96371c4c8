use spelunk_metal::{ancestors, is_identifier, node_at, GoParser, Pos};

#[test]
fn test_go_parser() {
    let mut parser = GoParser::new().expect("Failed to create parser");

    let source = r#"
package main

func hello() {
    fmt.Println("Hello, world!")
}
"#;
    let parsed = parser.parse("hello.go", source.to_string());
    assert!(parsed.is_ok(), "Go parser failed: {:?}", parsed.err());
    assert!(!parsed.unwrap().has_errors());
}

#[test]
fn test_go_parser_reports_syntax_errors() {
    let mut parser = GoParser::new().expect("Failed to create parser");
    let parsed = parser
        .parse("broken.go", "package main\n\nfunc {\n".to_string())
        .expect("tree-sitter always yields a tree");
    assert!(parsed.has_errors());
}

#[test]
fn test_selector_field_lookup() {
    let mut parser = GoParser::new().expect("Failed to create parser");
    let source = "package main\n\nfunc f() {\n\tx.Field = 1\n}\n";
    let parsed = parser.parse("sel.go", source.to_string()).unwrap();

    // Line 4: "\tx.Field = 1", the field starts at column 4.
    let node = node_at(parsed.root(), Pos::new(4, 5), |n| is_identifier(n.kind())).unwrap();
    assert_eq!(node.kind(), "field_identifier");
    assert_eq!(parsed.text(node), "Field");

    let chain = ancestors(node);
    assert_eq!(chain.first().map(|n| n.kind()), Some("source_file"));
    assert!(chain.iter().any(|n| n.kind() == "function_declaration"));
    assert_eq!(chain.last().map(|n| n.kind()), Some("selector_expression"));
}

#[test]
fn test_parsed_file_debug_names_path() {
    let mut parser = GoParser::new().expect("Failed to create parser");
    let parsed = parser.parse("dbg.go", "package dbg\n".to_string()).unwrap();
    let rendered = format!("{:?}", parsed);
    assert!(rendered.contains("ParsedFile"));
    assert!(rendered.contains("dbg.go"));
}
