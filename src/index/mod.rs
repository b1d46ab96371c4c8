//! Definition index: extraction, content hashing, the SQLite store, and
//! the find query engine on top of it.
//!
//! # Example
//!
//! ```no_run
//! use spelunk::config::GoEnv;
//! use spelunk::index::{self, FindQuery, IndexOptions, Store};
//! use spelunk::workspace::ImportResolver;
//!
//! let resolver = ImportResolver::new(GoEnv::load()?);
//! let cwd = std::env::current_dir()?;
//! let db = spelunk::paths::default_index_path();
//!
//! let store = Store::open_read_write(&db)?;
//! index::index_packages(&store, &["./...".to_string()], &cwd, &resolver, IndexOptions::default())?;
//! store.close()?;
//!
//! let store = Store::open_read_only(&db)?;
//! let query = FindQuery::new("^New", vec!["./...".to_string()], false)?;
//! for m in index::find(&store, &query, &cwd, &resolver)? {
//!     println!("{}:{} {} {}", m.path.display(), m.line_num, m.kind, m.name);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

mod driver;
mod extract;
mod find;
mod hash;
mod store;

pub use driver::{build_record, index_packages, unique_imports, IndexOptions, IndexSummary};
pub use extract::{extract_defs, extract_file, Def, DefKind};
pub use find::{find, FindQuery, Match};
pub use hash::{hash_files, hashed_paths, package_hash};
pub use store::{FileRecord, PackageRecord, Store};
