//! Inspect queries against the Go fixture modules in tests/testdata.
//!
//! The fixtures import nothing from the standard library, so these tests
//! do not need a Go installation.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use spelunk::config::GoEnv;
use spelunk::inspect::{InspectOptions, InspectResult, Inspector, Relation, RelationKind};
use spelunk::loc::FileLoc;
use spelunk::workspace::ImportResolver;

fn fixture(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(rel)
}

fn inspector() -> Inspector {
    Inspector::new(Arc::new(ImportResolver::new(GoEnv::default())))
}

fn inspect(rel: &str, line: usize, column: usize, options: &InspectOptions) -> Result<Option<InspectResult>> {
    inspector().inspect(&FileLoc::new(fixture(rel), line, column), options)
}

fn definition(rel: &str, line: usize, column: usize) -> Result<InspectResult> {
    inspect(rel, line, column, &InspectOptions::default())?
        .ok_or_else(|| anyhow::anyhow!("no result at {}:{}:{}", rel, line, column))
}

fn relation(kind: RelationKind, pkg: &str, name: &str, rel: &str, line: usize, column: usize) -> Relation {
    Relation::new(kind, pkg, name, FileLoc::new(fixture(rel), line, column))
}

fn names(result: &InspectResult) -> Vec<&str> {
    result.relations.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn test_local_variable_definition() -> Result<()> {
    let result = definition("structs/struct.go", 17, 9)?;
    assert_eq!(result.name, "localVar");
    assert_eq!(result.ty, "int");
    assert_eq!(
        result.relations,
        vec![relation(RelationKind::Definition, "structs", "localVar", "structs/struct.go", 16, 2)]
    );
    Ok(())
}

#[test]
fn test_struct_literal_field_definition() -> Result<()> {
    let result = definition("structs/struct.go", 13, 3)?;
    assert_eq!(result.name, "StringField");
    assert_eq!(result.ty, "string");
    assert_eq!(
        result.relations,
        vec![relation(RelationKind::Definition, "structs", "StringField", "structs/struct.go", 6, 2)]
    );
    Ok(())
}

#[test]
fn test_selector_field_definition() -> Result<()> {
    let result = definition("structs/struct.go", 16, 16)?;
    assert_eq!(result.name, "IntField");
    assert_eq!(result.ty, "int");
    assert_eq!(result.relations[0].loc, FileLoc::new(fixture("structs/struct.go"), 7, 2));
    Ok(())
}

#[test]
fn test_promoted_field_from_other_package() -> Result<()> {
    let result = definition("structs/struct.go", 16, 29)?;
    assert_eq!(result.name, "Depth");
    assert_eq!(result.ty, "int");
    assert_eq!(
        result.relations,
        vec![relation(RelationKind::Definition, "inner", "Depth", "structs/inner/inner.go", 4, 2)]
    );
    Ok(())
}

#[test]
fn test_embedded_type_definition() -> Result<()> {
    let result = definition("structs/struct.go", 8, 8)?;
    assert_eq!(result.name, "Embedded");
    assert_eq!(result.ty, "example.com/structs/inner.Embedded");
    assert_eq!(
        result.relations,
        vec![relation(RelationKind::Definition, "inner", "Embedded", "structs/inner/inner.go", 3, 6)]
    );
    Ok(())
}

#[test]
fn test_promoted_method_definition() -> Result<()> {
    let result = definition("structs/struct.go", 17, 22)?;
    assert_eq!(result.name, "Sub");
    assert_eq!(result.ty, "func() example.com/structs/inner.Embedded");
    assert_eq!(result.relations[0].loc, FileLoc::new(fixture("structs/inner/inner.go"), 7, 19));
    Ok(())
}

#[test]
fn test_constant_definition() -> Result<()> {
    let result = definition("structs/struct.go", 23, 9)?;
    assert_eq!(result.name, "intConst");
    assert_eq!(result.ty, "untyped int");
    assert_eq!(result.relations[0].loc, FileLoc::new(fixture("structs/struct.go"), 20, 7));
    Ok(())
}

#[test]
fn test_integer_literal_has_no_result() -> Result<()> {
    assert!(inspect("structs/struct.go", 23, 20, &InspectOptions::default())?.is_none());
    Ok(())
}

#[test]
fn test_package_name_has_no_type() -> Result<()> {
    let result = definition("structs/struct.go", 8, 2)?;
    assert_eq!(result.name, "inner");
    assert_eq!(result.ty, "");
    Ok(())
}

#[test]
fn test_interface_method_call_definition() -> Result<()> {
    let result = definition("ifaces/iface.go", 11, 11)?;
    assert_eq!(result.name, "IfaceMethodTwo");
    assert_eq!(result.ty, "func(param example.com/ifaces.ParamType) int");
    assert_eq!(
        result.relations,
        vec![relation(RelationKind::Definition, "ifaces", "IfaceMethodTwo", "ifaces/iface.go", 7, 2)]
    );
    Ok(())
}

#[test]
fn test_definition_in_test_file() -> Result<()> {
    let result = definition("defs/defs_test.go", 3, 6)?;
    assert_eq!(result.name, "TestStruct");
    assert_eq!(result.relations[0].loc, FileLoc::new(fixture("defs/defs_test.go"), 3, 6));
    Ok(())
}

#[test]
fn test_implementations_regardless_of_receiver_kind() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Implementation]);
    let result = inspect("ifaces/iface.go", 5, 6, &options)?.expect("result");
    assert_eq!(
        result.relations,
        vec![
            relation(RelationKind::Implementation, "ifaces", "MyInterfaceImpl", "ifaces/impl.go", 3, 6),
            relation(
                RelationKind::Implementation,
                "ifaces",
                "MyInterfacePointerImpl",
                "ifaces/impl.go",
                13,
                6
            ),
        ]
    );
    Ok(())
}

#[test]
fn test_implementations_across_search_dir() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Implementation]).with_search_dir(fixture("ifaces"));
    let result = inspect("ifaces/iface.go", 5, 6, &options)?.expect("result");
    assert_eq!(
        names(&result),
        vec!["MyInterfaceImpl", "MyInterfacePointerImpl", "MyInterfaceSubpkgImpl"]
    );
    assert_eq!(result.relations[2].pkg, "subpkg");
    assert_eq!(result.relations[2].loc, FileLoc::new(fixture("ifaces/subpkg/impl.go"), 7, 6));
    Ok(())
}

#[test]
fn test_method_implementations() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Implementation]);
    let result = inspect("ifaces/iface.go", 6, 2, &options)?.expect("result");
    assert_eq!(
        result.relations,
        vec![
            relation(
                RelationKind::Implementation,
                "ifaces",
                "MyInterfaceImpl.IfaceMethodOne()",
                "ifaces/impl.go",
                5,
                26
            ),
            relation(
                RelationKind::Implementation,
                "ifaces",
                "MyInterfacePointerImpl.IfaceMethodOne()",
                "ifaces/impl.go",
                15,
                34
            ),
        ]
    );
    Ok(())
}

#[test]
fn test_interfaces_of_type() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Interface]);
    let result = inspect("ifaces/impl.go", 3, 6, &options)?.expect("result");
    assert_eq!(
        result.relations,
        vec![relation(RelationKind::Interface, "ifaces", "MyInterface", "ifaces/iface.go", 5, 6)]
    );
    Ok(())
}

#[test]
fn test_interfaces_of_method() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Interface]);
    let result = inspect("ifaces/impl.go", 5, 26, &options)?.expect("result");
    assert_eq!(
        result.relations,
        vec![relation(
            RelationKind::Interface,
            "ifaces",
            "MyInterface.IfaceMethodOne",
            "ifaces/iface.go",
            6,
            2
        )]
    );
    Ok(())
}

#[test]
fn test_interfaces_of_plain_function_are_empty() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Interface]);
    let result = inspect("ifaces/iface.go", 10, 6, &options)?.expect("result");
    assert_eq!(result.name, "Use");
    assert!(result.relations.is_empty());
    Ok(())
}

#[test]
fn test_references_within_package() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Reference]);
    let result = inspect("ifaces/iface.go", 5, 6, &options)?.expect("result");
    let locs: Vec<FileLoc> = result.relations.iter().map(|r| r.loc.clone()).collect();
    assert_eq!(
        locs,
        vec![
            FileLoc::new(fixture("ifaces/iface.go"), 10, 12),
            FileLoc::new(fixture("ifaces/impl.go"), 23, 7),
            FileLoc::new(fixture("ifaces/impl.go"), 24, 7),
        ]
    );
    assert_eq!(result.relations[0].name, "MyInterface in Use() params");
    assert_eq!(result.relations[1].name, "MyInterface in declaration of _");
    Ok(())
}

#[test]
fn test_references_across_search_dir() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Reference]).with_search_dir(fixture("ifaces"));
    let result = inspect("ifaces/iface.go", 5, 6, &options)?.expect("result");
    assert_eq!(result.relations.len(), 4);
    let last = &result.relations[3];
    assert_eq!(last.pkg, "subpkg");
    assert_eq!(last.loc, FileLoc::new(fixture("ifaces/subpkg/impl.go"), 17, 9));
    Ok(())
}

#[test]
fn test_references_need_a_declaration() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Reference]);
    let result = inspect("ifaces/iface.go", 10, 12, &options)?.expect("result");
    assert_eq!(result.name, "MyInterface");
    assert!(result.relations.is_empty());
    Ok(())
}

#[test]
fn test_repeated_queries_are_identical() -> Result<()> {
    let options = InspectOptions::new(RelationKind::ALL.to_vec()).with_search_dir(fixture("ifaces"));
    let first = serde_json::to_string(&inspect("ifaces/iface.go", 5, 6, &options)?)?;
    let second = serde_json::to_string(&inspect("ifaces/iface.go", 5, 6, &options)?)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_references_from_test_file_reach_other_test_files() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Reference]);
    let result = inspect("testuse/a_test.go", 3, 6, &options)?.expect("result");
    assert_eq!(result.name, "helperT");
    assert_eq!(
        result.relations,
        vec![relation(
            RelationKind::Reference,
            "testuse",
            "helperT in other() body",
            "testuse/b_test.go",
            4,
            9
        )]
    );
    Ok(())
}

#[test]
fn test_references_from_plain_file_skip_test_files() -> Result<()> {
    let options = InspectOptions::new(vec![RelationKind::Reference]);
    let result = inspect("testuse/v.go", 3, 6, &options)?.expect("result");
    assert_eq!(result.name, "Used");
    assert!(result.relations.is_empty());
    Ok(())
}

#[test]
fn test_method_of_instantiated_generic_uses_type_arguments() -> Result<()> {
    let result = definition("generics/box.go", 13, 11)?;
    assert_eq!(result.name, "Get");
    assert_eq!(result.ty, "func() int");
    assert_eq!(
        result.relations,
        vec![relation(RelationKind::Definition, "generics", "Get", "generics/box.go", 7, 17)]
    );
    Ok(())
}

#[test]
fn test_field_of_instantiated_generic_uses_type_arguments() -> Result<()> {
    let result = definition("generics/box.go", 13, 21)?;
    assert_eq!(result.name, "Val");
    assert_eq!(result.ty, "int");
    assert_eq!(result.relations[0].loc, FileLoc::new(fixture("generics/box.go"), 4, 2));
    Ok(())
}

#[test]
fn test_instantiated_type_string_carries_arguments() -> Result<()> {
    let result = definition("generics/box.go", 13, 9)?;
    assert_eq!(result.name, "b");
    assert_eq!(result.ty, "example.com/generics.Box[int]");
    Ok(())
}

#[test]
fn test_generic_method_declaration_keeps_type_parameter() -> Result<()> {
    let result = definition("generics/box.go", 7, 17)?;
    assert_eq!(result.name, "Get");
    assert_eq!(result.ty, "func() T");
    Ok(())
}
