//! List command engine: definitions of matched packages straight from
//! source, without the index.

use anyhow::Result;
use serde::Serialize;
use spelunk_metal::GoParser;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::index::{extract_file, unique_imports, Def, DefKind};
use crate::loc::FileLoc;
use crate::syntax::is_exported;
use crate::workspace::{self, ImportResolver, PackageMeta, Variant};

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub include_struct_fields: bool,
    pub include_interface_methods: bool,
    pub include_private: bool,
    pub include_tests: bool,
    /// List the packages imported by the matches instead of the matches
    pub only_imports: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListPackage {
    pub name: String,
    #[serde(rename = "ID")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Definition {
    #[serde(flatten)]
    pub loc: FileLoc,
    pub name: String,
    pub pkg: ListPackage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResult {
    pub defs: Vec<Definition>,
}

/// Definitions of the packages matching `patterns`, sorted by path, line,
/// column and name. A file shared by a package and its test variant is
/// listed once, under the package.
pub fn list(
    patterns: &[String],
    cwd: &Path,
    resolver: &ImportResolver,
    options: ListOptions,
) -> Result<ListResult> {
    let matched = workspace::match_packages(patterns, cwd, resolver)?;
    let packages = if options.only_imports {
        imported_packages(&matched, resolver, options.include_tests)?
    } else {
        matched
    };

    let mut parser = GoParser::new()?;
    let mut seen_files: HashSet<PathBuf> = HashSet::new();
    let mut defs = Vec::new();
    for meta in &packages {
        let variants = if options.only_imports {
            vec![Variant::Plain]
        } else {
            meta.variants(options.include_tests)
        };
        for variant in variants {
            let pkg = ListPackage {
                name: variant_name(meta, variant),
                id: meta.variant_id(variant),
            };
            for path in meta.files(variant) {
                if !seen_files.insert(path.clone()) {
                    continue;
                }
                let file_defs = match extract_file(&mut parser, &path) {
                    Ok(file_defs) => file_defs,
                    Err(e) => {
                        warn!("could not list {} ({:#})", path.display(), e);
                        continue;
                    }
                };
                defs.extend(
                    file_defs
                        .into_iter()
                        .filter(|def| wanted(def, options))
                        .map(|def| Definition {
                            loc: FileLoc::new(&path, def.line, def.column),
                            name: def.name,
                            pkg: pkg.clone(),
                        }),
                );
            }
        }
    }

    defs.sort_by(|a, b| a.loc.cmp(&b.loc).then_with(|| a.name.cmp(&b.name)));
    Ok(ListResult { defs })
}

fn variant_name(meta: &PackageMeta, variant: Variant) -> String {
    match variant {
        Variant::XTest => format!("{}_test", meta.name),
        _ => meta.name.clone(),
    }
}

fn wanted(def: &Def, options: ListOptions) -> bool {
    let visible = |name: &str| options.include_private || is_exported(name);
    match def.kind {
        DefKind::StructField if !options.include_struct_fields => false,
        DefKind::InterfaceMethod if !options.include_interface_methods => false,
        // Members of an unexported type stay hidden with it
        DefKind::StructField | DefKind::InterfaceMethod => {
            def.owner().is_some_and(visible) && (options.include_private || def.exported)
        }
        _ => options.include_private || def.exported,
    }
}

/// Unique packages directly imported by `packages`, sorted by import path
fn imported_packages(
    packages: &[PackageMeta],
    resolver: &ImportResolver,
    include_tests: bool,
) -> Result<Vec<PackageMeta>> {
    let mut imports: BTreeMap<String, PathBuf> = unique_imports(packages);
    if include_tests {
        for meta in packages {
            for import in meta.test_imports.iter().chain(&meta.xtest_imports) {
                imports
                    .entry(import.clone())
                    .or_insert_with(|| meta.dir.clone());
            }
        }
    }

    let mut out: Vec<PackageMeta> = Vec::new();
    for (import, from) in imports {
        for meta in workspace::resolve_dirs(&[import], &from, resolver)? {
            if !out.iter().any(|m| m.dir == meta.dir) {
                out.push(meta);
            }
        }
    }
    out.sort_by(|a, b| a.import_path.cmp(&b.import_path));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, kind: DefKind) -> Def {
        let member = name.rsplit('.').next().unwrap_or(name);
        Def {
            name: name.to_string(),
            kind,
            line: 1,
            column: 1,
            exported: is_exported(member),
        }
    }

    #[test]
    fn test_private_definitions_need_flag() {
        let options = ListOptions::default();
        assert!(wanted(&def("MyFunc", DefKind::Func), options));
        assert!(!wanted(&def("privateFunc", DefKind::Func), options));
        let options = ListOptions {
            include_private: true,
            ..ListOptions::default()
        };
        assert!(wanted(&def("privateFunc", DefKind::Func), options));
    }

    #[test]
    fn test_fields_of_private_types_are_hidden() {
        let options = ListOptions {
            include_struct_fields: true,
            ..ListOptions::default()
        };
        assert!(wanted(&def("MyStruct.MyField", DefKind::StructField), options));
        assert!(!wanted(&def("privateStruct.PublicField", DefKind::StructField), options));
        assert!(!wanted(&def("MyStruct.privateField", DefKind::StructField), options));
        assert!(!wanted(
            &def("MyInterface.String", DefKind::InterfaceMethod),
            options
        ));
    }

    #[test]
    fn test_methods_follow_their_own_name() {
        let options = ListOptions::default();
        assert!(wanted(&def("hidden.Exported", DefKind::Method), options));
        assert!(!wanted(&def("Shown.hidden", DefKind::Method), options));
    }
}
