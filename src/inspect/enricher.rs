//! Relation enrichers and the shared state they run against.
//!
//! Every relation kind is produced by one [`Enricher`]. The inspector keeps
//! a registry of them and runs those the caller asked for, in registry
//! order, against one [`Query`].

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::binder::{bind, Binding};
use super::loader::{dedup_variants, load_package, LoadedPackage};
use super::position::{ident_at, IdentAt};
use super::relation::{Relation, RelationKind};
use crate::loc::FileLoc;
use crate::types::{FileId, ObjId, PackageId, Program};
use crate::workspace::{load_matching, ImportResolver};

/// Everything known about one inspection
pub struct Query {
    pub loc: FileLoc,
    pub search_dir: Option<PathBuf>,
    pub resolver: Arc<ImportResolver>,
    /// Package containing `loc`
    pub target: LoadedPackage,
    pub file: FileId,
    /// Whether search loads include test files; only when the query
    /// starts in one
    pub include_tests: bool,
}

impl Query {
    pub fn program(&self) -> &Program {
        &self.target.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.target.program
    }

    pub fn ident(&self) -> Option<IdentAt> {
        ident_at(self.program(), self.file, self.loc.pos())
    }

    pub fn binding(&self) -> Option<(IdentAt, Binding)> {
        let ident = self.ident()?;
        let binding = bind(self.program(), self.file, ident.offset)?;
        Some((ident, binding))
    }

    /// Packages that are, or import, the package `decl_path` in `decl_dir`.
    ///
    /// Candidates come from the search directory; the declaring package is
    /// always part of the result. Importers are only loaded when
    /// `importers` is set.
    pub fn search_packages(&self, decl_dir: &Path, decl_path: &str, importers: bool) -> Result<Vec<LoadedPackage>> {
        let include_tests = self.include_tests;
        let resolver = &self.resolver;
        let mut loaded = match &self.search_dir {
            Some(dir) => load_matching(
                dir,
                resolver,
                |skeleton| {
                    skeleton.dir == decl_dir
                        || (importers && skeleton.imports(decl_path, include_tests))
                },
                |skeleton| load_package(resolver, &skeleton.dir, include_tests),
            )?,
            None => Vec::new(),
        };
        if !loaded.iter().any(|p| p.dir() == decl_dir) {
            loaded.extend(load_package(resolver, decl_dir, include_tests)?);
        }
        let loaded = dedup_variants(loaded);
        debug!(
            decl = decl_path,
            packages = ?loaded.iter().map(|p| p.id()).collect::<Vec<_>>(),
            "search packages"
        );
        Ok(loaded)
    }
}

/// Name of the package owning `obj`, empty for predeclared objects
pub fn package_name(program: &Program, obj: ObjId) -> String {
    program
        .object(obj)
        .pkg
        .map(|p| program.package(p).name.clone())
        .unwrap_or_default()
}

/// Import path and directory of the package declaring `obj`
pub fn declaring_package(program: &Program, obj: ObjId) -> Option<(PackageId, String, PathBuf)> {
    let pkg = program.object(obj).pkg?;
    let package = program.package(pkg);
    if package.fake {
        return None;
    }
    Some((pkg, package.path.clone(), package.dir.clone()))
}

/// Strategy producing one kind of relation
pub trait Enricher: Send + Sync {
    fn kind(&self) -> RelationKind;

    /// Append this enricher's relations. Missing bindings or positions
    /// contribute nothing; only load failures are errors.
    fn enrich(&self, query: &mut Query, out: &mut Vec<Relation>) -> Result<()>;
}
