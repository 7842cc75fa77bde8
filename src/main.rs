use clap::{Parser as ClapParser, Subcommand};
use sift_lang::{
    cli::{self, CheckOptions, CheckResult, CliError, RunOptions},
    DEFAULT_MAX_DEPTH,
};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sift")]
#[command(about = "Sift - A request language for filtering, sorting and paginating data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a request and validate it against a schema
    Check {
        /// The request to check
        request: String,

        /// Schema file (JSON); without one only syntax is checked
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Maximum nesting depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Largest accepted limit
        #[arg(long)]
        max_limit: Option<u64>,

        /// Print the canonical form of the request
        #[arg(long)]
        print: bool,
    },

    /// Run a request against JSON documents
    Run {
        /// The request to run
        request: String,

        /// JSON documents (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Schema file (JSON) to validate against first
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Maximum nesting depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Largest accepted limit
        #[arg(long)]
        max_limit: Option<u64>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'sift docs' to list categories)
        category: String,
    },
}

fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            request,
            schema,
            max_depth,
            max_limit,
            print,
        } => run_check(request, schema, max_depth, max_limit, print),
        Commands::Run {
            request,
            input,
            schema,
            max_depth,
            max_limit,
            pretty,
        } => run_run(request, input, schema, max_depth, max_limit, pretty),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_schema(path: Option<PathBuf>) -> Result<Option<String>, CliError> {
    path.map(fs::read_to_string).transpose().map_err(CliError::Io)
}

fn run_check(
    request: String,
    schema: Option<PathBuf>,
    max_depth: usize,
    max_limit: Option<u64>,
    print: bool,
) -> Result<(), CliError> {
    let options = CheckOptions {
        request,
        schema: read_schema(schema)?,
        max_depth,
        max_limit,
        print,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Valid => println!("Request is valid"),
        CheckResult::Printed(canonical) => println!("{}", canonical),
    }
    Ok(())
}

fn run_run(
    request: String,
    input: Option<String>,
    schema: Option<PathBuf>,
    max_depth: usize,
    max_limit: Option<u64>,
    pretty: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        request,
        schema: read_schema(schema)?,
        input,
        max_depth,
        max_limit,
    };

    let output = cli::execute_run(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);
    Ok(())
}
