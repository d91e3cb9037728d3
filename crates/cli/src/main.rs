mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use bnfkit_core::ParseOptions;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// bnfkit grammar toolkit.
#[derive(Parser)]
#[command(name = "bnfkit", version, about = "bnfkit grammar toolkit")]
struct Cli {
    /// Output format (text or json) [default: text]
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log filter, e.g. `debug` or `bnfkit_core=trace` (overrides BNFKIT_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum rule nesting depth while parsing
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Abort a parse after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an arithmetic expression
    Eval {
        /// Expression; several arguments are joined with spaces
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        expr: Vec<String>,
    },

    /// Print the tokens of a source text
    Tokens {
        /// Source text
        source: String,
        /// Keep whitespace and comment tokens
        #[arg(long)]
        raw: bool,
        /// Lex with the word profile and build SQL-ish words
        #[arg(long)]
        words: bool,
    },

    /// Print the parse tree of an arithmetic expression
    Parse {
        /// Expression; several arguments are joined with spaces
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        expr: Vec<String>,
    },

    /// Translate a SQL-ish query into query parameters
    Sqlish {
        /// Query; several arguments are joined with spaces
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

/// Effective settings after merging the config file with flags.
pub(crate) struct Settings {
    pub output: OutputFormat,
    pub quiet: bool,
    pub parse: ParseOptions,
}

fn main() {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => match config::read_config(path) {
            Ok(c) => c,
            Err(msg) => {
                report_error(&msg, cli.output.unwrap_or(OutputFormat::Text), cli.quiet);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let log_level = cli.log_level.as_deref().or(file_config.log.level.as_deref());
    logging::init(log_level);

    let settings = settings(&cli, &file_config);

    match cli.command {
        Commands::Eval { expr } => commands::eval::cmd_eval(&expr.join(" "), &settings),
        Commands::Tokens { source, raw, words } => {
            commands::tokens::cmd_tokens(&source, raw, words, &settings)
        }
        Commands::Parse { expr } => commands::parse::cmd_parse(&expr.join(" "), &settings),
        Commands::Sqlish { query } => commands::sqlish::cmd_sqlish(&query.join(" "), &settings),
    }
}

/// Flags win over the config file.
fn settings(cli: &Cli, file: &Config) -> Settings {
    let mut parse = ParseOptions::default();
    if let Some(depth) = cli.max_depth.or(file.parse.max_depth) {
        parse = parse.max_depth(depth);
    }
    if let Some(ms) = cli.timeout_ms.or(file.parse.timeout_ms) {
        parse = parse.timeout(Duration::from_millis(ms));
    }
    Settings {
        output: cli.output.or(file.output).unwrap_or(OutputFormat::Text),
        quiet: cli.quiet || file.quiet.unwrap_or(false),
        parse,
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
