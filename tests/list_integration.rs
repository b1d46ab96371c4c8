use anyhow::Result;
use std::path::{Path, PathBuf};

use spelunk::config::GoEnv;
use spelunk::list::{list, ListOptions};
use spelunk::workspace::ImportResolver;

fn fixture(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(rel)
}

/// (name, file name, line, column) of every listed definition
fn listed(module: &str, options: ListOptions) -> Result<Vec<(String, String, usize, usize)>> {
    let resolver = ImportResolver::new(GoEnv::default());
    let result = list(&[".".to_string()], &fixture(module), &resolver, options)?;
    Ok(result
        .defs
        .into_iter()
        .map(|d| {
            let file = d
                .loc
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (d.name, file, d.loc.line, d.loc.column)
        })
        .collect())
}

fn expect(rows: &[(&str, &str, usize, usize)]) -> Vec<(String, String, usize, usize)> {
    rows.iter()
        .map(|(name, file, line, col)| (name.to_string(), file.to_string(), *line, *col))
        .collect()
}

#[test]
fn test_public_definitions_only() -> Result<()> {
    let defs = listed("defs", ListOptions::default())?;
    assert_eq!(
        defs,
        expect(&[
            ("MyVar", "defs.go", 3, 5),
            ("MyConst", "defs.go", 5, 7),
            ("MyStruct", "defs.go", 7, 6),
            ("MyInterface", "defs.go", 17, 6),
            ("MyFunc", "defs.go", 21, 1),
        ])
    );
    Ok(())
}

#[test]
fn test_include_struct_fields() -> Result<()> {
    let options = ListOptions {
        include_struct_fields: true,
        ..Default::default()
    };
    let defs = listed("defs", options)?;
    assert_eq!(
        defs,
        expect(&[
            ("MyVar", "defs.go", 3, 5),
            ("MyConst", "defs.go", 5, 7),
            ("MyStruct", "defs.go", 7, 6),
            ("MyStruct.MyField", "defs.go", 8, 2),
            ("MyInterface", "defs.go", 17, 6),
            ("MyFunc", "defs.go", 21, 1),
        ])
    );
    Ok(())
}

#[test]
fn test_include_interface_methods() -> Result<()> {
    let options = ListOptions {
        include_interface_methods: true,
        ..Default::default()
    };
    let defs = listed("defs", options)?;
    assert_eq!(
        defs,
        expect(&[
            ("MyVar", "defs.go", 3, 5),
            ("MyConst", "defs.go", 5, 7),
            ("MyStruct", "defs.go", 7, 6),
            ("MyInterface", "defs.go", 17, 6),
            ("MyInterface.String", "defs.go", 18, 2),
            ("MyFunc", "defs.go", 21, 1),
        ])
    );
    Ok(())
}

#[test]
fn test_include_private() -> Result<()> {
    let options = ListOptions {
        include_private: true,
        ..Default::default()
    };
    let defs = listed("defs", options)?;
    assert_eq!(
        defs,
        expect(&[
            ("MyVar", "defs.go", 3, 5),
            ("MyConst", "defs.go", 5, 7),
            ("MyStruct", "defs.go", 7, 6),
            ("privateStruct", "defs.go", 12, 6),
            ("MyInterface", "defs.go", 17, 6),
            ("MyFunc", "defs.go", 21, 1),
            ("privateFunc", "defs.go", 25, 1),
        ])
    );
    Ok(())
}

#[test]
fn test_private_fields_of_private_types() -> Result<()> {
    let options = ListOptions {
        include_private: true,
        include_struct_fields: true,
        ..Default::default()
    };
    let names: Vec<String> = listed("defs", options)?.into_iter().map(|d| d.0).collect();
    assert!(names.contains(&"MyStruct.privateField".to_string()));
    assert!(names.contains(&"privateStruct.PublicField".to_string()));
    assert!(names.contains(&"privateStruct.privateField".to_string()));
    Ok(())
}

#[test]
fn test_include_tests() -> Result<()> {
    let options = ListOptions {
        include_tests: true,
        ..Default::default()
    };
    let resolver = ImportResolver::new(GoEnv::default());
    let result = list(&[".".to_string()], &fixture("defs"), &resolver, options)?;

    let names: Vec<&str> = result.defs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["MyVar", "MyConst", "MyStruct", "MyInterface", "MyFunc", "TestStruct"]
    );

    let test_def = &result.defs[5];
    assert_eq!(test_def.loc.line, 3);
    assert_eq!(test_def.loc.column, 6);
    assert_eq!(test_def.pkg.name, "defs");
    assert_eq!(test_def.pkg.id, "example.com/defs [example.com/defs.test]");
    assert_eq!(result.defs[0].pkg.id, "example.com/defs");
    Ok(())
}

#[test]
fn test_only_imports_lists_imported_packages() -> Result<()> {
    let options = ListOptions {
        only_imports: true,
        ..Default::default()
    };
    let defs = listed("structs", options)?;
    assert_eq!(
        defs,
        expect(&[("Embedded", "inner.go", 3, 6), ("Embedded.Sub", "inner.go", 7, 1)])
    );
    Ok(())
}

#[test]
fn test_json_shape() -> Result<()> {
    let resolver = ImportResolver::new(GoEnv::default());
    let result = list(&[".".to_string()], &fixture("defs"), &resolver, ListOptions::default())?;
    let value = serde_json::to_value(&result)?;
    let first = &value["Defs"][0];
    assert_eq!(first["Name"], "MyVar");
    assert_eq!(first["Line"], 3);
    assert_eq!(first["Pkg"]["ID"], "example.com/defs");
    Ok(())
}
