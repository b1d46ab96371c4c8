use anyhow::Result;
use std::io;

use spelunk::config::GoEnv;
use spelunk::list::{self, ListOptions};
use spelunk::output::Template;
use spelunk::workspace::ImportResolver;

pub const DEFAULT_FORMAT: &str = "{{ range .Defs }}{{.Name}} {{.Path|RelPath}}:{{.Line}}:{{.Column}}\\n{{end}}";

/// List definitions of the matched packages straight from source
pub fn execute(patterns: Vec<String>, format: String, options: ListOptions) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let template = Template::parse(&format, &cwd)?;
    let patterns = super::default_patterns(patterns);

    let resolver = ImportResolver::new(GoEnv::load()?);
    let result = list::list(&patterns, &cwd, &resolver, options)?;
    template.render_to(&mut io::stdout().lock(), &result)
}
