//! Indexing driver: expands patterns (and optionally their imports) and
//! refreshes the record of every package whose content hash changed.

use anyhow::{Context, Result};
use spelunk_metal::GoParser;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::extract::extract_file;
use super::hash::package_hash;
use super::store::{FileRecord, PackageRecord, Store};
use crate::workspace::{self, ImportResolver, PackageMeta};

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    pub include_imports: bool,
    /// Follow imports of imports; implies `include_imports`
    pub transitive: bool,
    /// Reindex even when the content hash is unchanged
    pub force: bool,
    /// Suppress progress lines on stdout
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub indexed: usize,
    pub skipped: usize,
}

/// Index the packages matching `patterns`.
pub fn index_packages(
    store: &Store,
    patterns: &[String],
    cwd: &Path,
    resolver: &ImportResolver,
    options: IndexOptions,
) -> Result<IndexSummary> {
    let mut packages = workspace::match_packages(patterns, cwd, resolver)?;
    if options.include_imports || options.transitive {
        let imported = import_closure(&packages, resolver, options.transitive)?;
        packages.extend(imported);
    }
    debug!(count = packages.len(), "packages to index");

    let mut parser = GoParser::new()?;
    let mut summary = IndexSummary::default();
    for meta in &packages {
        let hash = package_hash(meta)?;
        if !options.force && is_unchanged(store, meta, &hash)? {
            progress(options, format_args!("Skipping {} (unchanged)", meta.import_path));
            summary.skipped += 1;
            continue;
        }

        progress(options, format_args!("Indexing {}", meta.import_path));
        let record = build_record(&mut parser, meta, hash);
        store.write_package(&record)?;
        summary.indexed += 1;
    }

    info!(
        indexed = summary.indexed,
        skipped = summary.skipped,
        "index complete"
    );
    Ok(summary)
}

fn progress(options: IndexOptions, line: std::fmt::Arguments<'_>) {
    if !options.quiet {
        println!("{}", line);
    }
}

fn is_unchanged(store: &Store, meta: &PackageMeta, hash: &str) -> Result<bool> {
    let existing = store
        .read_package(&meta.dir)
        .with_context(|| format!("Failed to read index record for {}", meta.dir.display()))?;
    Ok(existing.is_some_and(|rec| !rec.hash.is_empty() && rec.hash == hash))
}

/// Extract every source file of `meta`; files that fail to parse are
/// logged and left out
pub fn build_record(parser: &mut GoParser, meta: &PackageMeta, hash: String) -> PackageRecord {
    let mut files = Vec::new();
    for filename in meta
        .go_files
        .iter()
        .chain(&meta.test_go_files)
        .chain(&meta.xtest_go_files)
    {
        let path = meta.dir.join(filename);
        match extract_file(parser, &path) {
            Ok(defs) => files.push(FileRecord {
                filename: filename.clone(),
                defs,
            }),
            Err(e) => warn!("could not index {} ({:#})", path.display(), e),
        }
    }

    PackageRecord {
        name: meta.name.clone(),
        dir: meta.dir.clone(),
        import_path: meta.import_path.clone(),
        imports: meta.imports.clone(),
        hash,
        files,
    }
}

/// Packages imported by `roots`, excluding the roots themselves. With
/// `transitive`, imports are followed until nothing new turns up.
fn import_closure(
    roots: &[PackageMeta],
    resolver: &ImportResolver,
    transitive: bool,
) -> Result<Vec<PackageMeta>> {
    let mut seen: HashSet<PathBuf> = roots.iter().map(|m| m.dir.clone()).collect();
    let mut out = Vec::new();
    let mut frontier: Vec<PackageMeta> = roots.to_vec();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for (import, from) in unique_imports(&frontier) {
            for meta in workspace::resolve_dirs(&[import], &from, resolver)? {
                if seen.insert(meta.dir.clone()) {
                    next.push(meta);
                }
            }
        }
        out.extend(next.iter().cloned());
        if !transitive {
            break;
        }
        frontier = next;
    }
    Ok(out)
}

/// Sorted unique import paths of `packages`, each with the directory of
/// the first package importing it
pub fn unique_imports<'a, I>(packages: I) -> BTreeMap<String, PathBuf>
where
    I: IntoIterator<Item = &'a PackageMeta>,
{
    let mut out = BTreeMap::new();
    for meta in packages {
        for import in &meta.imports {
            out.entry(import.clone()).or_insert_with(|| meta.dir.clone());
        }
    }
    out
}
