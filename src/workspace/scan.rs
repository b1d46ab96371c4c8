//! Native package listing: reads package clauses and imports of every
//! buildable `.go` file in a directory.

use anyhow::{Context, Result};
use spelunk_metal::{GoParser, ParsedFile};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::constraint;
use super::resolve::ImportResolver;
use super::{ModuleRef, PackageMeta};

/// Package clause and imports of one file
#[derive(Debug, Default)]
struct FileHeader {
    package: String,
    imports: Vec<String>,
}

fn read_header(parsed: &ParsedFile) -> FileHeader {
    let mut header = FileHeader::default();
    let root = parsed.root();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_clause" => {
                let mut inner = child.walk();
                let first = child.named_children(&mut inner).next();
                if let Some(name) = first {
                    header.package = parsed.text(name).to_string();
                }
            }
            "import_declaration" => collect_imports(parsed, child, &mut header.imports),
            "comment" => {}
            _ => break,
        }
    }
    header
}

fn collect_imports(parsed: &ParsedFile, node: tree_sitter::Node<'_>, out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                if let Some(path) = child.child_by_field_name("path") {
                    let text = parsed.text(path).trim_matches(|c| c == '"' || c == '`');
                    out.push(text.to_string());
                }
            }
            "import_spec_list" => collect_imports(parsed, child, out),
            _ => {}
        }
    }
}

/// Whether a directory entry name is a candidate Go source file
fn is_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.starts_with('.') && !name.starts_with('_')
}

fn sorted_imports(set: BTreeSet<String>) -> Vec<String> {
    set.into_iter().filter(|p| p != "C").collect()
}

/// List the package in `dir`, or `None` when it holds no buildable Go files
pub fn scan_dir(dir: &Path, resolver: &ImportResolver) -> Result<Option<PackageMeta>> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|n| is_go_source(n))
        .collect();
    if names.is_empty() {
        return Ok(None);
    }
    names.sort();

    let mut parser = GoParser::new()?;
    let mut sources = Vec::new();
    let mut headers = Vec::new();
    for name in names {
        let path = dir.join(&name);
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if !constraint::file_matches(&name, &source) {
            debug!(file = %path.display(), "excluded by build constraints");
            continue;
        }
        let parsed = parser.parse(&path, source)?;
        let header = read_header(&parsed);
        if header.package.is_empty() {
            debug!(file = %path.display(), "no package clause");
            continue;
        }
        sources.push(name);
        headers.push(header);
    }

    // The package name comes from non-test files, else from in-package tests
    let package_name = sources
        .iter()
        .zip(&headers)
        .find(|(name, _)| !name.ends_with("_test.go"))
        .or_else(|| {
            sources
                .iter()
                .zip(&headers)
                .find(|(_, h)| !h.package.ends_with("_test"))
        })
        .map(|(_, h)| h.package.clone())
        .or_else(|| {
            headers
                .first()
                .map(|h| h.package.trim_end_matches("_test").to_string())
        });
    let Some(name) = package_name else {
        return Ok(None);
    };
    let xtest_name = format!("{name}_test");

    let mut meta = PackageMeta {
        dir: dir.to_path_buf(),
        import_path: resolver.import_path_of(dir)?,
        name: name.clone(),
        module: resolver.module_for(dir)?.map(|m| ModuleRef {
            path: m.module.clone(),
            root: m.root.clone(),
        }),
        ..PackageMeta::default()
    };
    let mut imports = BTreeSet::new();
    let mut test_imports = BTreeSet::new();
    let mut xtest_imports = BTreeSet::new();

    for (file, header) in sources.into_iter().zip(headers) {
        let is_test = file.ends_with("_test.go");
        if !is_test && header.package == name {
            imports.extend(header.imports);
            meta.go_files.push(file);
        } else if is_test && header.package == name {
            test_imports.extend(header.imports);
            meta.test_go_files.push(file);
        } else if is_test && header.package == xtest_name {
            xtest_imports.extend(header.imports);
            meta.xtest_go_files.push(file);
        } else {
            warn!(
                dir = %dir.display(),
                "found packages {} ({}) and {}",
                name,
                file,
                header.package
            );
        }
    }

    meta.imports = sorted_imports(imports);
    meta.test_imports = sorted_imports(test_imports);
    meta.xtest_imports = sorted_imports(xtest_imports);
    Ok(Some(meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoEnv;
    use tempfile::TempDir;

    #[test]
    fn test_scan_classifies_files() -> Result<()> {
        let tmp = TempDir::new()?;
        let root = tmp.path();
        fs::write(root.join("go.mod"), "module example.com/m\n")?;
        fs::write(
            root.join("a.go"),
            "package m\n\nimport (\n\t\"fmt\"\n\t\"C\"\n)\n",
        )?;
        fs::write(root.join("a_test.go"), "package m\n\nimport \"testing\"\n")?;
        fs::write(
            root.join("x_test.go"),
            "package m_test\n\nimport \"example.com/m\"\n",
        )?;
        fs::write(root.join("gen.go"), "//go:build ignore\n\npackage main\n")?;

        let resolver = ImportResolver::new(GoEnv::default());
        let meta = scan_dir(root, &resolver)?.expect("package");
        assert_eq!(meta.name, "m");
        assert_eq!(meta.import_path, "example.com/m");
        assert_eq!(meta.go_files, vec!["a.go"]);
        assert_eq!(meta.test_go_files, vec!["a_test.go"]);
        assert_eq!(meta.xtest_go_files, vec!["x_test.go"]);
        assert_eq!(meta.imports, vec!["fmt"]);
        assert_eq!(meta.test_imports, vec!["testing"]);
        assert_eq!(meta.xtest_imports, vec!["example.com/m"]);
        assert_eq!(meta.module.as_ref().map(|m| m.path.as_str()), Some("example.com/m"));
        Ok(())
    }

    #[test]
    fn test_scan_empty_directory() -> Result<()> {
        let tmp = TempDir::new()?;
        let resolver = ImportResolver::new(GoEnv::default());
        assert!(scan_dir(tmp.path(), &resolver)?.is_none());
        Ok(())
    }
}
