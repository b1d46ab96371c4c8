//! Symbol inspection: what is under the cursor and how it relates to the
//! rest of the workspace.
//!
//! An inspection loads the package containing the queried file with every
//! function body stripped except the ones spanning the queried line, binds
//! the identifier under the cursor, and runs the requested enrichers. Each
//! enricher that searches beyond the file loads the packages under the
//! search directory that can see the symbol.
//!
//! ```no_run
//! use spelunk::inspect::{InspectOptions, Inspector, RelationKind};
//! use spelunk::loc::FileLoc;
//!
//! let inspector = Inspector::from_env()?;
//! let options = InspectOptions::new(vec![RelationKind::Definition, RelationKind::Reference]);
//! if let Some(result) = inspector.inspect(&FileLoc::new("main.go", 12, 5), &options)? {
//!     println!("{} {}", result.name, result.ty);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

mod binder;
mod definition;
mod enricher;
mod label;
mod loader;
mod position;
mod reference;
mod relation;
mod satisfaction;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub use binder::{bind, Binding};
pub use enricher::{Enricher, Query};
pub use label::reference_label;
pub use loader::{dedup_variants, load_for_file, load_package, LoadedPackage};
pub use position::{find_node_at, ident_at, IdentAt};
pub use relation::{canonicalize, Relation, RelationKind, RelationSet};

use crate::config::GoEnv;
use crate::loc::FileLoc;
use crate::types::Type;
use crate::workspace::ImportResolver;
use definition::DefinitionEnricher;
use reference::ReferenceEnricher;
use satisfaction::{ImplementationEnricher, InterfaceEnricher};

/// Answer to one inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectResult {
    pub name: String,
    /// Type string; empty for imports and untyped constructs
    #[serde(rename = "Type")]
    pub ty: String,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub kinds: Vec<RelationKind>,
    /// Root of the cross-package search; `None` searches only the
    /// declaring package
    pub search_dir: Option<PathBuf>,
}

impl InspectOptions {
    pub fn new(kinds: Vec<RelationKind>) -> Self {
        Self {
            kinds,
            search_dir: None,
        }
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self::new(vec![RelationKind::Definition])
    }
}

/// Runs inspections against a registry of enrichers
pub struct Inspector {
    resolver: Arc<ImportResolver>,
    enrichers: Vec<Box<dyn Enricher>>,
}

impl Inspector {
    pub fn new(resolver: Arc<ImportResolver>) -> Self {
        let enrichers: Vec<Box<dyn Enricher>> = vec![
            Box::new(DefinitionEnricher),
            Box::new(ReferenceEnricher),
            Box::new(ImplementationEnricher),
            Box::new(InterfaceEnricher),
        ];
        Self { resolver, enrichers }
    }

    /// Inspector over the Go installation found in the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Arc::new(ImportResolver::new(GoEnv::load()?))))
    }

    /// Inspect the identifier at `loc`.
    ///
    /// `Ok(None)` when no identifier is there or it binds to nothing.
    pub fn inspect(&self, loc: &FileLoc, options: &InspectOptions) -> Result<Option<InspectResult>> {
        let loc = loc
            .absolute()
            .with_context(|| format!("Failed to resolve {}", loc.path.display()))?;
        let include_tests = loc
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with("_test.go"));

        let (target, file) = load_for_file(&self.resolver, &loc.path, loc.line, true)?;
        let mut query = Query {
            loc,
            search_dir: options.search_dir.clone(),
            resolver: self.resolver.clone(),
            target,
            file,
            include_tests,
        };

        let Some((ident, binding)) = query.binding() else {
            debug!(loc = %query.loc, "no symbol at location");
            return Ok(None);
        };
        let program = query.program_mut();
        let t = program.obj_type(binding.obj);
        let ty = match program.ty(t) {
            Type::Invalid => String::new(),
            _ => program.object_type_string(binding.obj),
        };

        let mut relations = Vec::new();
        for enricher in self.enrichers.iter().filter(|e| options.kinds.contains(&e.kind())) {
            enricher
                .enrich(&mut query, &mut relations)
                .with_context(|| format!("Failed to compute {} relations", enricher.kind()))?;
        }
        canonicalize(&mut relations);

        Ok(Some(InspectResult {
            name: ident.name,
            ty,
            relations,
        }))
    }
}
