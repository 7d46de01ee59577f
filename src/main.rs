use bibtag::config::{self, BibtagConfig, ValueStyle};
use bibtag::tags::Stage;
use bibtag::{output, pipeline};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared flags for commands that read a database.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Database files, read as one database (stdin when omitted)
    files: Vec<PathBuf>,

    /// Config file (default: bibtag.toml in the working directory, if present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Args, Clone)]
struct TagArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Write the database here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Tag stage to run; repeat in the order wanted (replaces pipeline.stages)
    #[arg(short = 'S', long = "stage", value_name = "STAGE")]
    stages: Vec<Stage>,

    /// Keep entries in input order
    #[arg(long)]
    no_sort: bool,

    /// Record replaced tags in an `oldtag` field
    #[arg(long)]
    save_old_tags: bool,

    /// Write attr=value instead of attr = value
    #[arg(long)]
    compact_equals: bool,

    /// Drop hyphens from names and titles in generated tags
    #[arg(long)]
    no_hyphens: bool,

    /// Rewrite quoted values with braces
    #[arg(long, conflicts_with = "quotes")]
    braces: bool,

    /// Rewrite braced values with quotes
    #[arg(long)]
    quotes: bool,

    /// Spaces before each attribute name (0-20)
    #[arg(long, value_name = "N")]
    attribute_indent: Option<usize>,

    /// Column where values start (0-40)
    #[arg(long, value_name = "N")]
    value_indent: Option<usize>,

    /// Write a JSON run report here
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

impl TagArgs {
    /// Layer command-line flags over the loaded config.
    fn apply(&self, config: &mut BibtagConfig) {
        if !self.stages.is_empty() {
            config.pipeline.stages = self.stages.clone();
        }
        if self.no_sort {
            config.output.sort = false;
        }
        if self.save_old_tags {
            config.output.save_old_tags = true;
        }
        if self.compact_equals {
            config.output.compact_equals = true;
        }
        if self.no_hyphens {
            config.tag.hyphens = false;
        }
        if self.braces {
            config.output.delimiters = ValueStyle::Braces;
        }
        if self.quotes {
            config.output.delimiters = ValueStyle::Quotes;
        }
        if let Some(n) = self.attribute_indent {
            config.output.attribute_indent = n;
        }
        if let Some(n) = self.value_indent {
            config.output.value_indent = n;
        }
    }
}

#[derive(Parser)]
#[command(name = "bibtag")]
#[command(about = "Recompute citation tags in a BibTeX database")]
#[command(long_about = "\
Recompute citation tags in a BibTeX database

Every entry gets a tag built from configurable stages, collisions get a
letter suffix, and the database is rewritten in a normalized layout.
Comments between entries are kept as they are.

Stages (run in the order given, each appending to the tag):
  author       letters from the authors' (or editors') surnames
  title        initial letters of significant title words
  year         trailing digits of the year
  check        pronounceable checksum letters
  extension    keep the old tag if the new one is a prefix of it
  previous     the old tag verbatim
  unique       letter suffix against tags already handed out
  literal:TEXT fixed text

Without stages, tags are built as: author, year, extension, unique.
Cross-reference targets keep their tags. A `newtag` field forces a tag.

Run 'bibtag gen-config' to generate a documented bibtag.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retag, sort and rewrite a database
    Tag(TagArgs),
    /// Parse and link a database, reporting problems without writing it
    Check(InputArgs),
    /// Print a stock bibtag.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Tag(args) => {
            let mut config = load_config(args.input.config.as_deref())?;
            args.apply(&mut config);
            config.validate()?;

            let input = pipeline::read_inputs(&args.input.files)?;
            let outcome = pipeline::run(&input, &config)?;
            match &args.output {
                Some(path) => std::fs::write(path, &outcome.output)?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(outcome.output.as_bytes())?;
                    stdout.flush()?;
                }
            }
            if let Some(path) = &args.report {
                output::write_report(path, &outcome)?;
            }
            output::print_tag_output(&outcome);
        }
        Command::Check(args) => {
            let config = load_config(args.config.as_deref())?;
            let input = pipeline::read_inputs(&args.files)?;
            let outcome = pipeline::check(&input, &config)?;
            output::print_check_output(&outcome);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// An explicit config path must exist; the default one is optional.
fn load_config(path: Option<&Path>) -> Result<BibtagConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(config::CONFIG_FILENAME)),
    }
}

/// Diagnostics go to stderr so they never mix with the database on stdout.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}
