//! Selective loading of the packages an inspection needs.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::loc::clean_path;
use crate::syntax::BodyFilter;
use crate::types::{FileId, PackageId, Program};
use crate::workspace::{scan_dir, ImportResolver, PackageMeta, Variant};

/// One compiled variant of a package, type checked in its own program
pub struct LoadedPackage {
    pub program: Program,
    pub pkg: PackageId,
    pub meta: PackageMeta,
    pub variant: Variant,
}

impl LoadedPackage {
    /// Import path of the variant, `_test` suffixed for external tests
    pub fn path(&self) -> String {
        self.meta.variant_path(self.variant)
    }

    /// Identifier in `p [p.test]` form
    pub fn id(&self) -> String {
        self.meta.variant_id(self.variant)
    }

    pub fn name(&self) -> &str {
        &self.program.package(self.pkg).name
    }

    pub fn dir(&self) -> &Path {
        &self.meta.dir
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.meta.files(self.variant)
    }
}

impl std::fmt::Debug for LoadedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPackage").field("id", &self.id()).finish()
    }
}

/// Load the package containing `path`, keeping only the function bodies of
/// that file which span `line`.
///
/// When several variants contain the file, the first in plain, test,
/// external test order wins.
pub fn load_for_file(
    resolver: &Arc<ImportResolver>,
    path: &Path,
    line: usize,
    include_tests: bool,
) -> Result<(LoadedPackage, FileId)> {
    let abs = clean_path(path).with_context(|| format!("Failed to resolve {}", path.display()))?;
    let dir = abs
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", abs.display()))?;
    let meta = scan_dir(dir, resolver)?
        .ok_or_else(|| anyhow!("Could not find Go package for path {:?}", path.display().to_string()))?;

    let variant = meta
        .variants(include_tests)
        .into_iter()
        .find(|v| meta.files(*v).contains(&abs))
        .ok_or_else(|| anyhow!("Could not find Go package for path {:?}", path.display().to_string()))?;

    debug!(file = %abs.display(), id = %meta.variant_id(variant), line, "loading target package");
    let mut program = Program::new(resolver.clone());
    let target = abs.clone();
    let pkg = program.load_target(&meta, variant, &move |file: &Path| {
        if file == target {
            BodyFilter::KeepSpanning(line)
        } else {
            BodyFilter::StripAll
        }
    })?;
    let file = program
        .file_by_path(&abs)
        .ok_or_else(|| anyhow!("Could not find syntax for {}", abs.display()))?;
    Ok((
        LoadedPackage {
            program,
            pkg,
            meta,
            variant,
        },
        file,
    ))
}

/// Load every variant of the package in `dir` with all bodies kept
pub fn load_package(resolver: &Arc<ImportResolver>, dir: &Path, include_tests: bool) -> Result<Vec<LoadedPackage>> {
    let Some(meta) = scan_dir(dir, resolver)? else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for variant in meta.variants(include_tests) {
        let mut program = Program::new(resolver.clone());
        let pkg = program
            .load_target(&meta, variant, &|_| BodyFilter::KeepAll)
            .with_context(|| format!("Failed to load {}", meta.variant_id(variant)))?;
        out.push(LoadedPackage {
            program,
            pkg,
            meta: meta.clone(),
            variant,
        });
    }
    Ok(out)
}

/// Keep one loaded package per import path. The test variant compiles the
/// package's own files plus its tests, so it replaces the plain one.
pub fn dedup_variants(packages: Vec<LoadedPackage>) -> Vec<LoadedPackage> {
    let mut by_path: HashMap<String, LoadedPackage> = HashMap::new();
    for loaded in packages {
        let path = loaded.path();
        match by_path.get(&path) {
            Some(existing) if existing.variant == Variant::Test => {}
            _ => {
                by_path.insert(path, loaded);
            }
        }
    }
    let mut out: Vec<LoadedPackage> = by_path.into_values().collect();
    out.sort_by(|a, b| a.path().cmp(&b.path()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoEnv;
    use std::fs;
    use tempfile::TempDir;

    fn variants_of(tmp: &TempDir) -> Result<Vec<LoadedPackage>> {
        let root = tmp.path();
        fs::write(root.join("go.mod"), "module example.com/m\n")?;
        fs::write(root.join("m.go"), "package m\n\nfunc F() {}\n")?;
        fs::write(root.join("m_test.go"), "package m\n\nfunc g() { F() }\n")?;
        let resolver = Arc::new(ImportResolver::new(GoEnv::default()));
        load_package(&resolver, root, true)
    }

    #[test]
    fn test_test_variant_replaces_plain() -> Result<()> {
        let tmp = TempDir::new()?;
        let loaded = variants_of(&tmp)?;
        let order: Vec<Variant> = loaded.iter().map(|p| p.variant).collect();
        assert_eq!(order, vec![Variant::Plain, Variant::Test]);

        let kept = dedup_variants(loaded);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].variant, Variant::Test);
        assert_eq!(kept[0].id(), "example.com/m [example.com/m.test]");
        Ok(())
    }

    #[test]
    fn test_test_variant_wins_in_either_order() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut loaded = variants_of(&tmp)?;
        loaded.reverse();

        let kept = dedup_variants(loaded);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].variant, Variant::Test);
        Ok(())
    }
}
