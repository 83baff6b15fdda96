//! TDIFF command-line interface.
//!
//! Reads two tree documents, diffs them and prints the result. Exit code 0
//! means no changes, 1 means changes were found, 2 means an error occurred.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tdiff_rs::parser::parse_stdin;
use tdiff_rs::{
    diff, format_result, parse_file, DiffOptions, DuplicateIdPolicy, FormatHint, OutputFormat,
    OutputOptions, ResultMode, TdiffError, Tree, TreeSchema,
};

/// TDIFF - Structural diff for id-keyed trees
///
/// Compares two versions of a tree stored as JSON, YAML or TOML and reports
/// which nodes were added, deleted, updated or moved.
#[derive(Parser)]
#[command(name = "tdiff")]
#[command(version)]
#[command(about = "Structural diff for id-keyed trees", long_about = None)]
struct Cli {
    /// Old version of the tree ("-" reads standard input)
    #[arg(value_name = "FILE1")]
    file1: PathBuf,

    /// New version of the tree ("-" reads standard input)
    #[arg(value_name = "FILE2")]
    file2: PathBuf,

    /// Result shape
    #[arg(short, long, value_enum, default_value = "tree")]
    mode: ModeArg,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "terminal")]
    format: OutputFormatArg,

    /// Hide unchanged nodes
    #[arg(short, long, default_value = "true", action = clap::ArgAction::Set)]
    compact: bool,

    /// Maximum length for displayed values
    #[arg(long, default_value = "80")]
    max_value_length: usize,

    /// Key holding each node's id
    #[arg(long, default_value = "id")]
    id_field: String,

    /// Key holding each node's children
    #[arg(long, default_value = "children")]
    children_field: String,

    /// Value field to ignore when comparing nodes (repeatable)
    #[arg(long = "ignore-field", value_name = "FIELD")]
    ignore_fields: Vec<String>,

    /// Fail when a tree contains the same id twice
    #[arg(long)]
    reject_duplicate_ids: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (only show changes, suppress summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Result mode argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ModeArg {
    /// Nested diff tree
    Tree,
    /// One line per node, in traversal order
    Flat,
    /// Nested diff tree plus a changed flag
    Summary,
}

impl From<ModeArg> for ResultMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Tree => ResultMode::Tree,
            ModeArg::Flat => ResultMode::Flat,
            ModeArg::Summary => ResultMode::Summary,
        }
    }
}

/// Output format argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormatArg {
    /// Colored terminal output
    Terminal,
    /// JSON representation
    Json,
    /// Plain text (no colors)
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Terminal => OutputFormat::Terminal,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    if is_stdin(&cli.file1) && is_stdin(&cli.file2) {
        return Err(TdiffError::ConfigError {
            message: "only one input can be read from standard input".to_string(),
        }
        .into());
    }
    if cli.id_field == cli.children_field {
        return Err(TdiffError::ConfigError {
            message: format!("id and children fields are both '{}'", cli.id_field),
        }
        .into());
    }

    let schema = TreeSchema::new(cli.id_field.as_str(), cli.children_field.as_str());

    let old = read_tree(&cli.file1, &schema)
        .with_context(|| format!("Failed to parse first file: {}", cli.file1.display()))?;
    let new = read_tree(&cli.file2, &schema)
        .with_context(|| format!("Failed to parse second file: {}", cli.file2.display()))?;

    let options = if cli.ignore_fields.is_empty() {
        DiffOptions::new()
    } else {
        DiffOptions::ignoring_fields(cli.ignore_fields.iter().cloned())
    };
    let duplicate_ids = if cli.reject_duplicate_ids {
        DuplicateIdPolicy::Reject
    } else {
        DuplicateIdPolicy::LastWins
    };
    let options = options
        .with_result_mode(cli.mode.into())
        .with_duplicate_ids(duplicate_ids);

    tracing::debug!(?options, "computing diff");
    let result = diff(&old, &new, &options).context("Failed to compute diff")?;

    let output_options = OutputOptions {
        compact: cli.compact,
        max_value_length: cli.max_value_length,
    };
    let output_format: OutputFormat = cli.format.into();
    let output = format_result(&result, &output_format, &output_options)
        .context("Failed to format diff output")?;

    if !cli.quiet || output_format == OutputFormat::Json {
        println!("{}", output);
    } else {
        for line in output.lines() {
            if !line.starts_with("Summary:") && !line.trim().is_empty() {
                println!("{}", line);
            }
        }
    }

    if result.has_changes() {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_tree(path: &Path, schema: &TreeSchema) -> Result<Tree, tdiff_rs::ParseError> {
    if is_stdin(path) {
        parse_stdin(FormatHint::Auto, schema)
    } else {
        parse_file(path, schema)
    }
}
