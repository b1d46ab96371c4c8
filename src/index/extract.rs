//! Package Extractor: top-level definitions of a single Go file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use spelunk_metal::{GoParser, Pos};
use std::fmt;
use std::path::Path;

use crate::syntax::ast::{Decl, Expr, Field, FuncDecl, InterfaceElem, Spec, TypeSpec, ValueSpec};
use crate::syntax::{self, is_exported};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefKind {
    /// `var` and `const` names
    Value,
    Type,
    StructField,
    InterfaceMethod,
    Func,
    /// Function with a receiver, named `Recv.Name`
    Method,
}

impl DefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefKind::Value => "value",
            DefKind::Type => "type",
            DefKind::StructField => "struct_field",
            DefKind::InterfaceMethod => "interface_method",
            DefKind::Func => "func",
            DefKind::Method => "method",
        }
    }

    /// Struct fields and interface methods, named `Owner.Member`
    pub fn is_member(&self) -> bool {
        matches!(self, DefKind::StructField | DefKind::InterfaceMethod)
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One definition. The position is where the declaring construct starts:
/// the first name of a value spec, the type name, the first name of a
/// field, or the `func` keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Def {
    pub name: String,
    pub kind: DefKind,
    pub line: usize,
    pub column: usize,
    /// Whether the defined name (the member, for `Owner.Member`) is exported
    pub exported: bool,
}

impl Def {
    fn new(name: String, kind: DefKind, pos: Pos, exported_name: &str) -> Self {
        Self {
            name,
            kind,
            line: pos.line,
            column: pos.column,
            exported: is_exported(exported_name),
        }
    }

    /// `Owner` of an `Owner.Member` or `Recv.Method` name
    pub fn owner(&self) -> Option<&str> {
        match self.kind {
            DefKind::StructField | DefKind::InterfaceMethod | DefKind::Method => {
                self.name.split_once('.').map(|(owner, _)| owner)
            }
            _ => None,
        }
    }
}

/// Definitions of a source text, in file order.
///
/// Source that does not parse cleanly is an error; callers skip the file.
pub fn extract_defs(parser: &mut GoParser, path: &Path, source: String) -> Result<Vec<Def>> {
    let parsed = parser.parse(path, source)?;
    if parsed.has_errors() {
        bail!("syntax error in {}", path.display());
    }
    let file = syntax::lower(&parsed);

    let mut defs = Vec::new();
    for decl in &file.decls {
        match decl {
            Decl::Gen(gen) => {
                for spec in &gen.specs {
                    match spec {
                        Spec::Value(spec) => value_defs(spec, &mut defs),
                        Spec::Type(spec) => type_defs(spec, &mut defs),
                    }
                }
            }
            Decl::Func(func) => defs.push(func_def(func)),
        }
    }
    Ok(defs)
}

/// Read `path` and extract its definitions
pub fn extract_file(parser: &mut GoParser, path: &Path) -> Result<Vec<Def>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    extract_defs(parser, path, source)
}

fn value_defs(spec: &ValueSpec, out: &mut Vec<Def>) {
    let Some(first) = spec.names.first() else {
        return;
    };
    for name in &spec.names {
        out.push(Def::new(name.name.clone(), DefKind::Value, first.span.start, &name.name));
    }
}

fn type_defs(spec: &TypeSpec, out: &mut Vec<Def>) {
    let type_name = &spec.name.name;
    out.push(Def::new(type_name.clone(), DefKind::Type, spec.name.span.start, type_name));

    match &spec.ty {
        Expr::StructType { fields, .. } => {
            for field in fields {
                member_defs(type_name, field, out);
            }
        }
        Expr::InterfaceType { elems, .. } => {
            for elem in elems {
                if let InterfaceElem::Method { name, .. } = elem {
                    out.push(Def::new(
                        format!("{}.{}", type_name, name.name),
                        DefKind::InterfaceMethod,
                        name.span.start,
                        &name.name,
                    ));
                }
            }
        }
        _ => {}
    }
}

/// Named fields only; embedded fields define nothing new
fn member_defs(type_name: &str, field: &Field, out: &mut Vec<Def>) {
    for name in &field.names {
        out.push(Def::new(
            format!("{}.{}", type_name, name.name),
            DefKind::StructField,
            field.span.start,
            &name.name,
        ));
    }
}

fn func_def(func: &FuncDecl) -> Def {
    let receiver = func
        .recv
        .as_ref()
        .and_then(|recv| recv.list.first())
        .and_then(|field| field.ty.base_ident());
    match receiver {
        Some(recv) => Def::new(
            format!("{}.{}", recv.name, func.name.name),
            DefKind::Method,
            func.span.start,
            &func.name.name,
        ),
        None => Def::new(func.name.name.clone(), DefKind::Func, func.span.start, &func.name.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &str = r#"package testmodule

var MyVar string

const MyConst = 123

type MyStruct struct {
	MyField      string
	privateField int
	Embedded
}

type MyInterface interface {
	String() string
}

func MyFunc() string {
	var local int
	return "Test"
}

func (s *MyStruct) Method() {}
"#;

    fn extract(source: &str) -> Result<Vec<Def>> {
        let mut parser = GoParser::new()?;
        extract_defs(&mut parser, Path::new("defs.go"), source.to_string())
    }

    #[test]
    fn test_extract_values_in_file_order() -> Result<()> {
        let defs = extract(DEFS)?;
        assert_eq!(
            defs[0],
            Def {
                name: "MyVar".to_string(),
                kind: DefKind::Value,
                line: 3,
                column: 5,
                exported: true,
            }
        );
        assert_eq!(
            defs[1],
            Def {
                name: "MyConst".to_string(),
                kind: DefKind::Value,
                line: 5,
                column: 7,
                exported: true,
            }
        );
        Ok(())
    }

    #[test]
    fn test_extract_members_and_methods() -> Result<()> {
        let defs = extract(DEFS)?;
        let summary: Vec<(&str, DefKind, usize, usize)> = defs
            .iter()
            .map(|d| (d.name.as_str(), d.kind, d.line, d.column))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("MyVar", DefKind::Value, 3, 5),
                ("MyConst", DefKind::Value, 5, 7),
                ("MyStruct", DefKind::Type, 7, 6),
                ("MyStruct.MyField", DefKind::StructField, 8, 2),
                ("MyStruct.privateField", DefKind::StructField, 9, 2),
                ("MyInterface", DefKind::Type, 13, 6),
                ("MyInterface.String", DefKind::InterfaceMethod, 14, 2),
                ("MyFunc", DefKind::Func, 17, 1),
                ("MyStruct.Method", DefKind::Method, 22, 1),
            ]
        );
        let private = defs.iter().find(|d| d.name == "MyStruct.privateField");
        assert_eq!(private.map(|d| d.exported), Some(false));
        assert_eq!(defs[8].owner(), Some("MyStruct"));
        Ok(())
    }

    #[test]
    fn test_extract_rejects_syntax_errors() {
        assert!(extract("package broken\n\nfunc {\n").is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DefKind::InterfaceMethod.to_string(), "interface_method");
        assert_eq!(
            serde_json::to_string(&DefKind::StructField).ok(),
            Some("\"struct_field\"".to_string())
        );
    }
}
