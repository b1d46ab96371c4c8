use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

use spelunk::inspect::{InspectOptions, Inspector, RelationKind};
use spelunk::loc::FileLoc;
use spelunk::output::Template;

pub const DEFAULT_FORMAT: &str = "{{ .Name }} {{ .Type }}\\n{{ range .Relations }}{{ .Kind }} {{ .Pkg }} {{ .Name }} {{ .Path | RelPath }}:{{ .Line }}:{{ .Column }}\\n{{ end }}";

pub struct InspectArgs {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub format: String,
    pub search_dir: Option<PathBuf>,
    pub relations: Vec<RelationKind>,
    pub json: bool,
}

/// Inspect the identifier at a position and print the formatted result
pub fn execute(args: InspectArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let template = Template::parse(&args.format, &cwd)?;

    let mut options = if args.relations.is_empty() {
        InspectOptions::default()
    } else {
        InspectOptions::new(args.relations)
    };
    if let Some(dir) = args.search_dir {
        options = options.with_search_dir(dir);
    }

    let loc = FileLoc::new(&args.file, args.line, args.column);
    let inspector = Inspector::from_env()?;
    let Some(result) = inspector.inspect(&loc, &options)? else {
        eprintln!("No results found for {}", loc);
        return Ok(());
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &result)?;
        writeln!(out).context("Failed to write output")?;
    } else {
        template.render_to(&mut out, &result)?;
    }
    Ok(())
}
