#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "proflens: find professors from review profiles",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Search professors",
        long_about = "Retrieve, rerank and summarize the professors that best match a query.",
        after_help = "EXAMPLES:\n    # Ask a question\n    proflens search \"best professor for calculus\"\n\n    # Keep the top 3\n    proflens search \"organic chemistry\" -n 3\n\n    # Emit machine-readable output\n    proflens search \"easy grader\" --json"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        about = "Classify a query's subject",
        long_about = "Print the subject a query is routed to, or `none`.",
        after_help = "EXAMPLES:\n    proflens classify \"intro to quantum mechanics\""
    )]
    Classify(cmd::classify::ClassifyArgs),

    #[command(
        about = "Show corpus statistics",
        long_about = "Show corpus size, vector dimension and per-subject counts.",
        after_help = "EXAMPLES:\n    proflens stats\n\n    proflens stats --json"
    )]
    Stats,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PROFLENS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "proflens=debug,info"
        } else {
            "proflens=info,warn"
        })
    });

    let format = env::var("PROFLENS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Search(ref args) => cmd::search::run_search(args, output, &project_root),
        Commands::Classify(ref args) => cmd::classify::run_classify(args, output),
        Commands::Stats => cmd::stats::run_stats(output, &project_root),
    }
}
