//! Workspace model: modules, packages and their cheap metadata.
//!
//! Two kinds of package description exist and never mix. [`PackageMeta`]
//! is what the scanner reads from a directory (file lists, imports, module
//! identity). [`SkeletonPackage`] is the slimmed view the discoverer
//! filters on before anything is type checked.
//!
//! # Example
//!
//! ```no_run
//! use spelunk::config::GoEnv;
//! use spelunk::workspace::{self, ImportResolver};
//!
//! let resolver = ImportResolver::new(GoEnv::load()?);
//! let cwd = std::env::current_dir()?;
//! for pkg in workspace::match_packages(&["./...".to_string()], &cwd, &resolver)? {
//!     println!("{} {}", pkg.import_path, pkg.dir.display());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

mod constraint;
mod discover;
mod gomod;
mod resolve;
mod scan;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use constraint::{host_arch, host_os};
pub use discover::{candidate_packages, find_module_roots, load_matching};
pub use gomod::{GoMod, GO_MOD};
pub use resolve::{find_module_root, guess_package_name, ImportResolver};
pub use scan::scan_dir;

use crate::loc::clean_path;

/// Module a package belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub path: String,
    pub root: PathBuf,
}

impl ModuleRef {
    pub fn go_mod(&self) -> PathBuf {
        self.root.join(GO_MOD)
    }
}

/// Scanner output for one package directory
#[derive(Debug, Clone, Default)]
pub struct PackageMeta {
    pub dir: PathBuf,
    pub import_path: String,
    pub name: String,
    pub module: Option<ModuleRef>,
    /// File names relative to `dir`, sorted
    pub go_files: Vec<String>,
    pub test_go_files: Vec<String>,
    pub xtest_go_files: Vec<String>,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
    pub xtest_imports: Vec<String>,
}

/// How a package is compiled: alone, with its in-package tests, or as the
/// external `_test` package
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Plain,
    Test,
    XTest,
}

impl PackageMeta {
    pub fn variants(&self, include_tests: bool) -> Vec<Variant> {
        let mut out = Vec::new();
        if !self.go_files.is_empty() {
            out.push(Variant::Plain);
        }
        if include_tests {
            if !self.test_go_files.is_empty() {
                out.push(Variant::Test);
            }
            if !self.xtest_go_files.is_empty() {
                out.push(Variant::XTest);
            }
        }
        out
    }

    /// Absolute paths of the files compiled into `variant`
    pub fn files(&self, variant: Variant) -> Vec<PathBuf> {
        let names: Vec<&String> = match variant {
            Variant::Plain => self.go_files.iter().collect(),
            Variant::Test => self.go_files.iter().chain(&self.test_go_files).collect(),
            Variant::XTest => self.xtest_go_files.iter().collect(),
        };
        names.into_iter().map(|n| self.dir.join(n)).collect()
    }

    /// Imports of `variant`, sorted and deduplicated
    pub fn variant_imports(&self, variant: Variant) -> Vec<String> {
        let mut all: Vec<String> = match variant {
            Variant::Plain => self.imports.clone(),
            Variant::Test => self.imports.iter().chain(&self.test_imports).cloned().collect(),
            Variant::XTest => self.xtest_imports.clone(),
        };
        all.sort();
        all.dedup();
        all
    }

    /// Import path of `variant`; the external test package gets `_test`
    pub fn variant_path(&self, variant: Variant) -> String {
        match variant {
            Variant::XTest => format!("{}_test", self.import_path),
            _ => self.import_path.clone(),
        }
    }

    /// Identifier in the form the go command prints, e.g. `p [p.test]`
    pub fn variant_id(&self, variant: Variant) -> String {
        match variant {
            Variant::Plain => self.import_path.clone(),
            Variant::Test => format!("{0} [{0}.test]", self.import_path),
            Variant::XTest => format!("{0}_test [{0}.test]", self.import_path),
        }
    }

    pub fn skeleton(&self) -> SkeletonPackage {
        let mut test_imports: Vec<String> = self
            .test_imports
            .iter()
            .chain(&self.xtest_imports)
            .cloned()
            .collect();
        test_imports.sort();
        test_imports.dedup();
        SkeletonPackage {
            import_path: self.import_path.clone(),
            dir: self.dir.clone(),
            imports: self.imports.clone(),
            test_imports,
        }
    }
}

/// Minimal package description used for graph membership decisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonPackage {
    pub import_path: String,
    pub dir: PathBuf,
    pub imports: Vec<String>,
    /// Imports only reachable through test files
    pub test_imports: Vec<String>,
}

impl SkeletonPackage {
    pub fn imports(&self, path: &str, include_tests: bool) -> bool {
        self.imports.iter().any(|i| i == path)
            || (include_tests && self.test_imports.iter().any(|i| i == path))
    }
}

fn skip_dir(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.starts_with('.')
        || name.starts_with('_')
        || name == "testdata"
        || name == "vendor"
        || path.join(GO_MOD).is_file()
}

/// Every package under `root`, not descending into nested modules
pub fn walk_packages(root: &Path, resolver: &ImportResolver) -> Result<Vec<PackageMeta>> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !skip_dir(e.path()));
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(meta) = scan_dir(entry.path(), resolver)? {
            out.push(meta);
        }
    }
    Ok(out)
}

/// Expand package patterns relative to `cwd` into scanned packages.
///
/// Patterns are directories (`.`, `./x`, `/abs`), import paths, or either
/// followed by `/...`. A pattern that matches nothing is an error.
pub fn match_packages(
    patterns: &[String],
    cwd: &Path,
    resolver: &ImportResolver,
) -> Result<Vec<PackageMeta>> {
    let mut out: Vec<PackageMeta> = Vec::new();
    for pattern in patterns {
        let (base, recursive) = match pattern.strip_suffix("...") {
            Some(base) => (base.trim_end_matches('/'), true),
            None => (pattern.as_str(), false),
        };
        let base = if base.is_empty() { "." } else { base };

        let dir = if base.starts_with('.') || Path::new(base).is_absolute() {
            clean_path(&cwd.join(base))?
        } else {
            match resolver.resolve(cwd, base)? {
                Some(dir) => clean_path(&dir)?,
                None => bail!("cannot find package {:?}", base),
            }
        };

        let matched = if recursive {
            walk_packages(&dir, resolver)?
        } else {
            scan_dir(&dir, resolver)?.into_iter().collect()
        };
        if matched.is_empty() {
            bail!("no packages matched {:?}", pattern);
        }
        for meta in matched {
            if !out.iter().any(|m| m.dir == meta.dir) {
                out.push(meta);
            }
        }
    }
    Ok(out)
}

/// Directories of the packages behind `import_paths`, as seen from `from`;
/// unresolvable paths are skipped
pub fn resolve_dirs(
    import_paths: &[String],
    from: &Path,
    resolver: &ImportResolver,
) -> Result<Vec<PackageMeta>> {
    let mut out: Vec<PackageMeta> = Vec::new();
    for path in import_paths {
        let Some(dir) = resolver.resolve(from, path)? else {
            tracing::debug!(import = %path, "unresolved import");
            continue;
        };
        if out.iter().any(|m| m.dir == dir) {
            continue;
        }
        if let Some(meta) = scan_dir(&dir, resolver)? {
            out.push(meta);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoEnv;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> Result<TempDir> {
        let tmp = TempDir::new()?;
        let root = tmp.path();
        fs::write(root.join("go.mod"), "module example.com/m\n")?;
        fs::write(root.join("m.go"), "package m\n")?;
        fs::create_dir_all(root.join("sub/deep"))?;
        fs::write(root.join("sub/sub.go"), "package sub\n\nimport \"example.com/m\"\n")?;
        fs::write(root.join("sub/deep/deep.go"), "package deep\n")?;
        fs::create_dir_all(root.join("testdata"))?;
        fs::write(root.join("testdata/skip.go"), "package skip\n")?;
        fs::create_dir_all(root.join("nested"))?;
        fs::write(root.join("nested/go.mod"), "module example.com/nested\n")?;
        fs::write(root.join("nested/n.go"), "package nested\n")?;
        Ok(tmp)
    }

    #[test]
    fn test_recursive_pattern_skips_testdata_and_nested_modules() -> Result<()> {
        let tmp = fixture()?;
        let resolver = ImportResolver::new(GoEnv::default());
        let pkgs = match_packages(&["./...".to_string()], tmp.path(), &resolver)?;
        let paths: Vec<&str> = pkgs.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(paths, vec!["example.com/m", "example.com/m/sub", "example.com/m/sub/deep"]);
        Ok(())
    }

    #[test]
    fn test_import_path_pattern() -> Result<()> {
        let tmp = fixture()?;
        let resolver = ImportResolver::new(GoEnv::default());
        let pkgs = match_packages(&["example.com/m/sub".to_string()], tmp.path(), &resolver)?;
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].name, "sub");
        assert!(pkgs[0].skeleton().imports("example.com/m", false));
        Ok(())
    }

    #[test]
    fn test_pattern_without_packages_is_an_error() -> Result<()> {
        let tmp = fixture()?;
        let resolver = ImportResolver::new(GoEnv::default());
        assert!(match_packages(&["./testdata/nothing".to_string()], tmp.path(), &resolver).is_err());
        Ok(())
    }

    #[test]
    fn test_variant_ids_and_files() {
        let meta = PackageMeta {
            dir: PathBuf::from("/w/p"),
            import_path: "example.com/p".to_string(),
            name: "p".to_string(),
            go_files: vec!["p.go".to_string()],
            test_go_files: vec!["p_test.go".to_string()],
            xtest_go_files: vec!["x_test.go".to_string()],
            ..PackageMeta::default()
        };
        assert_eq!(meta.variants(false), vec![Variant::Plain]);
        assert_eq!(
            meta.variants(true),
            vec![Variant::Plain, Variant::Test, Variant::XTest]
        );
        assert_eq!(meta.variant_id(Variant::Test), "example.com/p [example.com/p.test]");
        assert_eq!(
            meta.files(Variant::Test),
            vec![PathBuf::from("/w/p/p.go"), PathBuf::from("/w/p/p_test.go")]
        );
    }
}
