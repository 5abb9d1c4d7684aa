//! `gvariant-codegen`: read a schema file and print the generated C
//! accessors for its declared types to stdout.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;

use gvariant_codegen::codegen::{self, Options};
use gvariant_codegen::model;
use gvariant_codegen::schema::Parser as SchemaParser;

/// Generate zero-copy C accessors for GVariant types from a schema file.
#[derive(ClapParser, Debug)]
#[command(name = "gvariant-codegen", version, about)]
struct Cli {
    /// Prepended to every emitted type and function name.
    #[arg(long, value_name = "NAME")]
    prefix: Option<String>,

    /// Compile `_format`/`_print` variant rendering to recurse into the
    /// variant's contents instead of printing its raw typestring.
    #[arg(long)]
    deep_variant_format: bool,

    /// Increase log verbosity; may be repeated.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// The schema file to compile.
    schema_file: PathBuf,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let src = fs::read_to_string(&cli.schema_file)
        .with_context(|| format!("reading {}", cli.schema_file.display()))?;

    tracing::info!(path = %cli.schema_file.display(), "parsing schema");
    let schema = SchemaParser::parse_source(&src)
        .with_context(|| format!("parsing {}", cli.schema_file.display()))?;

    tracing::info!(types = schema.defs.len(), "resolving named types");
    let registry = model::build_schema(&schema)
        .with_context(|| format!("resolving {}", cli.schema_file.display()))?;

    let options = Options {
        prefix: cli.prefix,
        deep_variant_format: cli.deep_variant_format,
    };
    let generated = codegen::generate(&registry, &options);
    print!("{}", generated);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}
