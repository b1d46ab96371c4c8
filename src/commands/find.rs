use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

use spelunk::config::GoEnv;
use spelunk::index::{self, FindQuery, Store};
use spelunk::output::Template;
use spelunk::paths;
use spelunk::workspace::ImportResolver;

pub const DEFAULT_FORMAT: &str = "{{ .Path | RelPath }}:{{ .LineNum }} {{ .Kind }} {{ .Name }}";

/// Print one formatted line per indexed definition matching `pattern`
pub fn execute(
    pattern: String,
    patterns: Vec<String>,
    include_imports: bool,
    format: String,
    index_flag: Option<PathBuf>,
) -> Result<()> {
    // Input failures surface before the index is touched
    let query = FindQuery::new(&pattern, patterns, include_imports)?;
    let cwd = std::env::current_dir()?;
    let template = Template::parse(&format, &cwd)?;

    let resolver = ImportResolver::new(GoEnv::load()?);
    let store = Store::open_read_only(&paths::index_path(index_flag))?;
    let matches = index::find(&store, &query, &cwd, &resolver);
    store.close()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for m in matches? {
        template.render_to(&mut out, &m)?;
        writeln!(out).context("Failed to write output")?;
    }
    Ok(())
}
