use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use spelunk::index::IndexOptions;
use spelunk::inspect::RelationKind;
use spelunk::list::ListOptions;
use spelunk::logging;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Quickly find definitions in Go projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add definitions from Go packages to the search index
    Index {
        /// Package patterns (default: the package in the current directory)
        patterns: Vec<String>,

        /// Also index packages imported by the matched packages
        #[arg(short = 'i', long)]
        include_imports: bool,

        /// Follow imports transitively (implies --include-imports)
        #[arg(short = 't', long)]
        transitive: bool,

        /// Do not print progress lines
        #[arg(short, long)]
        quiet: bool,

        /// Reindex packages even when unchanged
        #[arg(long)]
        force: bool,

        /// Index database path (default: SPELUNK_INDEX or the data directory)
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Search indexed definitions by name
    Find {
        /// Regular expression matched against definition names
        pattern: String,

        /// Package patterns (default: the package in the current directory)
        patterns: Vec<String>,

        /// Include exported definitions of imported packages
        #[arg(short = 'i', long)]
        include_imports: bool,

        /// Output template
        #[arg(short = 'f', long, default_value = commands::find::DEFAULT_FORMAT)]
        format: String,

        /// Index database path
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Inspect type information and relations of an identifier
    Inspect {
        /// Go source file
        #[arg(short, long)]
        file: PathBuf,

        /// Line number (1-based)
        #[arg(short, long)]
        line: usize,

        /// Column number (1-based)
        #[arg(short, long)]
        column: usize,

        /// Output template
        #[arg(short = 't', long = "template", default_value = commands::inspect::DEFAULT_FORMAT)]
        format: String,

        /// Directory searched for references, implementations and interfaces
        #[arg(short, long)]
        search_dir: Option<PathBuf>,

        /// Relations to include: definition, reference, implementation, interface
        #[arg(short, long = "relation", value_delimiter = ',')]
        relations: Vec<RelationKind>,

        /// Print the result as JSON instead of using the template
        #[arg(long)]
        json: bool,
    },

    /// List definitions in Go packages
    List {
        /// Package patterns (default: the package in the current directory)
        patterns: Vec<String>,

        /// Output template
        #[arg(short = 't', long = "template", default_value = commands::list::DEFAULT_FORMAT)]
        format: String,

        /// Include struct fields
        #[arg(long)]
        include_struct_fields: bool,

        /// Include interface methods
        #[arg(long)]
        include_interface_methods: bool,

        /// Include unexported definitions
        #[arg(short = 'p', long)]
        include_private: bool,

        /// Include definitions from test files
        #[arg(long)]
        include_tests: bool,

        /// List the packages imported by the matches instead
        #[arg(long)]
        only_imports: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match &cli.command {
        Commands::Index { quiet: false, .. } => "info",
        _ => "warn",
    };
    logging::init(level);

    match cli.command {
        Commands::Index {
            patterns,
            include_imports,
            transitive,
            quiet,
            force,
            index,
        } => {
            let options = IndexOptions {
                include_imports,
                transitive,
                force,
                quiet,
            };
            commands::index::execute(patterns, index, options)?;
        }
        Commands::Find {
            pattern,
            patterns,
            include_imports,
            format,
            index,
        } => {
            commands::find::execute(pattern, patterns, include_imports, format, index)?;
        }
        Commands::Inspect {
            file,
            line,
            column,
            format,
            search_dir,
            relations,
            json,
        } => {
            commands::inspect::execute(commands::inspect::InspectArgs {
                file,
                line,
                column,
                format,
                search_dir,
                relations,
                json,
            })?;
        }
        Commands::List {
            patterns,
            format,
            include_struct_fields,
            include_interface_methods,
            include_private,
            include_tests,
            only_imports,
        } => {
            let options = ListOptions {
                include_struct_fields,
                include_interface_methods,
                include_private,
                include_tests,
                only_imports,
            };
            commands::list::execute(patterns, format, options)?;
        }
    }

    Ok(())
}
