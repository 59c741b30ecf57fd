//! snapgrade CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "snapgrade", version, about = "Bubble-sheet grading and class analytics")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and an example test definition
    Init,

    /// Validate test definition TOML files
    Validate {
        /// Path to a test definition file or directory
        #[arg(long)]
        test: PathBuf,
    },

    /// List bubble-sheet templates
    Templates {
        /// Ask the configured recognition service instead of the built-in catalog
        #[arg(long)]
        remote: bool,
    },

    /// Register a test in the repository
    Create {
        /// Test definition TOML file
        #[arg(long, conflicts_with = "template")]
        test: Option<PathBuf>,

        /// Start from a template with every answer set to A
        #[arg(long)]
        template: Option<String>,

        /// Test id (with --template)
        #[arg(long)]
        id: Option<String>,

        /// Test title (with --template)
        #[arg(long)]
        title: Option<String>,

        /// Replace an existing test with the same id
        #[arg(long)]
        force: bool,
    },

    /// Recognise and grade scanned sheets
    Scan {
        /// Test to grade against
        #[arg(long)]
        test_id: String,

        /// Sheet images
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Student id to attach when the sheet does not carry one (single image only)
        #[arg(long)]
        student_id: Option<String>,
    },

    /// Grade pre-recognised responses from a JSON file
    Grade {
        /// Test to grade against
        #[arg(long)]
        test_id: String,

        /// JSON array of {student_name, student_id, responses}
        #[arg(long)]
        submissions: PathBuf,
    },

    /// Show class and per-question statistics
    Stats {
        #[arg(long)]
        test_id: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Export results
    Export {
        #[arg(long)]
        test_id: String,

        /// Output format: csv, json, html
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file (default: "<title>-results.<format>")
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Delete every result of a test
    Clear {
        #[arg(long)]
        test_id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snapgrade=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { test } => commands::validate::execute(test),
        Commands::Templates { remote } => commands::templates::execute(remote, config).await,
        Commands::Create {
            test,
            template,
            id,
            title,
            force,
        } => commands::create::execute(test, template, id, title, force, config).await,
        Commands::Scan {
            test_id,
            images,
            student_id,
        } => commands::scan::execute(test_id, images, student_id, config).await,
        Commands::Grade {
            test_id,
            submissions,
        } => commands::grade::execute(test_id, submissions, config).await,
        Commands::Stats { test_id, format } => {
            commands::stats::execute(test_id, format, config).await
        }
        Commands::Export {
            test_id,
            format,
            output,
        } => commands::export::execute(test_id, format, output, config).await,
        Commands::Clear { test_id } => commands::clear::execute(test_id, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
