use anyhow::Result;
use std::path::PathBuf;
use std::time::Instant;

use spelunk::config::GoEnv;
use spelunk::index::{self, IndexOptions, Store};
use spelunk::paths;
use spelunk::workspace::ImportResolver;

/// Index definitions of the packages matching `patterns`
pub fn execute(patterns: Vec<String>, index_flag: Option<PathBuf>, options: IndexOptions) -> Result<()> {
    let patterns = super::default_patterns(patterns);
    let resolver = ImportResolver::new(GoEnv::load()?);
    let cwd = std::env::current_dir()?;
    let db_path = paths::index_path(index_flag);

    if !options.quiet {
        println!("Searching for packages matching {:?}", patterns);
    }
    let start = Instant::now();
    let store = Store::open_read_write(&db_path)?;
    let summary = index::index_packages(&store, &patterns, &cwd, &resolver, options)?;
    store.close()?;

    tracing::info!(
        db = %db_path.display(),
        indexed = summary.indexed,
        skipped = summary.skipped,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "index written"
    );
    Ok(())
}
