//! Workspace discovery: module roots under a search directory and the
//! parallel load of the packages that pass a predicate.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::gomod::GO_MOD;
use super::{walk_packages, ImportResolver, SkeletonPackage};
use crate::loc::clean_path;

/// `search_dir` itself plus every directory below it holding a `go.mod`.
/// Absolute, sorted and free of duplicates.
pub fn find_module_roots(search_dir: &Path) -> Result<Vec<PathBuf>> {
    let search_dir = clean_path(search_dir)
        .with_context(|| format!("Failed to resolve {}", search_dir.display()))?;
    let mut roots = vec![search_dir.clone()];
    for entry in WalkDir::new(&search_dir) {
        let entry = entry.with_context(|| format!("Failed to walk {}", search_dir.display()))?;
        if entry.file_type().is_file() && entry.file_name() == GO_MOD {
            if let Some(dir) = entry.path().parent() {
                roots.push(dir.to_path_buf());
            }
        }
    }
    roots.sort();
    roots.dedup();
    Ok(roots)
}

/// Skeletons of the packages under `module_root`; empty when the directory
/// is not inside any module
pub fn candidate_packages(module_root: &Path, resolver: &ImportResolver) -> Result<Vec<SkeletonPackage>> {
    if resolver.module_for(module_root)?.is_none() {
        debug!(dir = %module_root.display(), "not in a module");
        return Ok(Vec::new());
    }
    Ok(walk_packages(module_root, resolver)?
        .iter()
        .map(|meta| meta.skeleton())
        .collect())
}

/// Load every package under `search_dir` accepted by `predicate`.
///
/// Loads fan out over the rayon pool, one task per accepted package. The
/// first failing load fails the whole call and sibling results are dropped.
pub fn load_matching<T, P, L>(
    search_dir: &Path,
    resolver: &ImportResolver,
    predicate: P,
    load: L,
) -> Result<Vec<T>>
where
    T: Send,
    P: Fn(&SkeletonPackage) -> bool,
    L: Fn(&SkeletonPackage) -> Result<Vec<T>> + Sync,
{
    let mut accepted: Vec<SkeletonPackage> = Vec::new();
    for root in find_module_roots(search_dir)? {
        for skeleton in candidate_packages(&root, resolver)? {
            if predicate(&skeleton) && !accepted.iter().any(|s| s.dir == skeleton.dir) {
                accepted.push(skeleton);
            }
        }
    }
    debug!(
        search_dir = %search_dir.display(),
        count = accepted.len(),
        "candidate packages"
    );
    if accepted.is_empty() {
        return Ok(Vec::new());
    }

    let loaded = Mutex::new(Vec::new());
    accepted.par_iter().try_for_each(|skeleton| -> Result<()> {
        let packages = load(skeleton)
            .with_context(|| format!("Failed to load {}", skeleton.import_path))?;
        loaded.lock().extend(packages);
        Ok(())
    })?;
    Ok(loaded.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoEnv;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> Result<TempDir> {
        let tmp = TempDir::new()?;
        let root = tmp.path();
        for (module, dir) in [("example.com/a", "a"), ("example.com/b", "nested/b")] {
            fs::create_dir_all(root.join(dir))?;
            fs::write(root.join(dir).join("go.mod"), format!("module {module}\n"))?;
        }
        fs::write(root.join("a/a.go"), "package a\n")?;
        fs::write(root.join("nested/b/b.go"), "package b\n\nimport \"example.com/a\"\n")?;
        Ok(tmp)
    }

    #[test]
    fn test_find_module_roots_includes_search_dir() -> Result<()> {
        let tmp = workspace()?;
        let root = clean_path(tmp.path())?;
        let roots = find_module_roots(tmp.path())?;
        assert_eq!(roots, vec![root.clone(), root.join("a"), root.join("nested/b")]);
        Ok(())
    }

    #[test]
    fn test_candidate_packages_outside_module_is_empty() -> Result<()> {
        let tmp = workspace()?;
        let resolver = ImportResolver::new(GoEnv::default());
        assert!(candidate_packages(tmp.path(), &resolver)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_matching_filters_by_predicate() -> Result<()> {
        let tmp = workspace()?;
        let resolver = ImportResolver::new(GoEnv::default());
        let loaded = load_matching(
            tmp.path(),
            &resolver,
            |s| s.imports("example.com/a", false),
            |s| Ok(vec![s.import_path.clone()]),
        )?;
        assert_eq!(loaded, vec!["example.com/b".to_string()]);
        Ok(())
    }

    #[test]
    fn test_load_matching_propagates_first_error() -> Result<()> {
        let tmp = workspace()?;
        let resolver = ImportResolver::new(GoEnv::default());
        let result: Result<Vec<()>> = load_matching(
            tmp.path(),
            &resolver,
            |_| true,
            |_| anyhow::bail!("broken package"),
        );
        assert!(result.is_err());
        Ok(())
    }
}
