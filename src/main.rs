mod app;
use flashdeck::*;

use app::MyApp;
use clap::Parser;
use config::AppConfig;
use database::db;
use generation::{CardGenerator, OpenAiGenerator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Flashcard decks with AI generation and study sessions
#[derive(Parser)]
#[command(name = "flashdeck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the config file (defaults to <config dir>/flashdeck/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite database, overrides the config file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    let conn = match db::open_database(&config.database.path) {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed to open database {:?}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    let generator: Arc<dyn CardGenerator> = match OpenAiGenerator::new(config.ai.clone()) {
        Ok(generator) => Arc::new(generator),
        Err(e) => {
            error!("Failed to build AI client: {}", e);
            std::process::exit(1);
        }
    };
    if !generator.is_configured() {
        info!("No AI provider key configured, generation is disabled");
    }

    let identity = config.identity.identity();
    match &identity.user_id {
        Some(user_id) => info!("Signed in as {} ({:?} plan)", user_id, identity.entitlements.plan),
        None => info!("No user configured, running signed out"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([560.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flashdeck",
        options,
        Box::new(|_cc| Ok(Box::new(MyApp::new(conn, identity, generator)))),
    )
}
