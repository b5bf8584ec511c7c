mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, session::SessionSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "readiness",
    about = "Business AI-readiness assessment: answer the questionnaire, get a readiness level",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .readiness/)
    #[arg(long, global = true, env = "READINESS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .readiness/ in the current project
    Init,

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: server.host from config)
        #[arg(long)]
        host: Option<String>,
    },

    /// List the question catalog
    Catalog,

    /// Start an assessment for a business
    Start {
        #[arg(long)]
        name: String,
        #[arg(long)]
        industry: String,
        #[arg(long)]
        size: String,
        #[arg(long)]
        location: String,
    },

    /// Show the next question of an assessment
    Next { id: String },

    /// Answer the current question (score 1-5)
    Answer {
        id: String,
        question: String,
        #[arg(allow_negative_numbers = true)]
        score: i64,
    },

    /// Show progress of an assessment
    Status { id: String },

    /// Show section scores, findings and (once complete) the readiness level
    Results { id: String },

    /// List, inspect and export stored sessions
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },

    /// Validate or show the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Serve { port, host } => cmd::serve::run(&root, host, port),
        Commands::Catalog => cmd::catalog::run(&root, cli.json),
        Commands::Start {
            name,
            industry,
            size,
            location,
        } => cmd::assess::start(&root, name, industry, size, location, cli.json),
        Commands::Next { id } => cmd::assess::next(&root, &id, cli.json),
        Commands::Answer {
            id,
            question,
            score,
        } => cmd::assess::answer(&root, &id, &question, score, cli.json),
        Commands::Status { id } => cmd::assess::status(&root, &id, cli.json),
        Commands::Results { id } => cmd::assess::results(&root, &id, cli.json),
        Commands::Session { subcommand } => cmd::session::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
