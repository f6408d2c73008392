use agri_insight::catalog::EntityCatalog;
use agri_insight::config::EngineConfig;
use agri_insight::engine::{Answer, QueryEngine};
use agri_insight::parser::QueryParser;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agri-insight")]
#[command(about = "Cited answers to questions about crop production and rainfall")]
#[command(version)]
struct Args {
    /// Engine config JSON (data paths, dataset names, defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Crop production CSV (or set AGRI_CROP_DATA)
    #[arg(long, global = true)]
    crop_data: Option<PathBuf>,

    /// Rainfall CSV (or set AGRI_RAINFALL_DATA)
    #[arg(long, global = true)]
    rainfall_data: Option<PathBuf>,

    /// Entity catalog JSON (or set AGRI_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question
    Ask {
        question: String,

        /// Print intent, result and text as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how a question is understood, without reading any data
    Parse { question: String },
    /// Answer questions from stdin, one per line
    Repl {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Commands::Ask { question, json } => {
            let engine = QueryEngine::from_config(&config)?;
            let answer = engine.ask(&question)?;
            print_answer(&answer, json)
        }
        Commands::Parse { question } => {
            let catalog = match &config.catalog {
                Some(path) => EntityCatalog::load(path)?,
                None => EntityCatalog::builtin()?,
            };
            let parser =
                QueryParser::new(Arc::new(catalog)).with_default_top_n(config.defaults.top_n);
            let intent = parser.parse(&question);
            println!("{}", serde_json::to_string_pretty(&intent)?);
            Ok(())
        }
        Commands::Repl { json } => run_repl(&config, json),
    }
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();

    // Flags beat both the file and the environment.
    if let Some(path) = &args.crop_data {
        config.crop_data = Some(path.clone());
    }
    if let Some(path) = &args.rainfall_data {
        config.rainfall_data = Some(path.clone());
    }
    if let Some(path) = &args.catalog {
        config.catalog = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_answer(answer: &Answer, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(answer)?);
    } else {
        println!("{}", answer.text);
    }
    Ok(())
}

/// One question at a time: each is answered in full before the next line
/// is read.
fn run_repl(config: &EngineConfig, json: bool) -> Result<()> {
    let engine = QueryEngine::from_config(config)?;
    info!("Ready. One question per line, empty line or Ctrl-D to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let question = line?;
        let question = question.trim();
        if question.is_empty() {
            break;
        }
        match engine.ask(question) {
            Ok(answer) => print_answer(&answer, json)?,
            Err(e) => error!("Could not answer: {}", e),
        }
        println!();
        stdout.flush()?;
    }
    Ok(())
}
