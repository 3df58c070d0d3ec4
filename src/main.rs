use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use spardha_registration::app::{AdminUseCase, SubmitUseCase};
use spardha_registration::catalog::{display_name, SportCatalog};
use spardha_registration::config::Config;
use spardha_registration::domain::{Gender, RegistrationFilter};
use spardha_registration::error::RegistrationError;
use spardha_registration::normalize::RawSubmission;
use spardha_registration::server::{self, AppState};
use spardha_registration::{logging, metrics, storage};

#[derive(Parser)]
#[command(name = "spardha")]
#[command(about = "Sports event registration service")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $SPARDHA_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Normalize and validate a JSON submission without storing it
    Check {
        /// JSON file holding one form submission
        file: PathBuf,
    },
    /// Print the registration roster grouped by sport and year
    Export {
        #[arg(long)]
        sport: Option<String>,
        #[arg(long)]
        year: Option<u8>,
        #[arg(long)]
        gender: Option<Gender>,
        /// Only registrations that named a partner for this sport
        #[arg(long)]
        partner: Option<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the sports on offer
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let _guard = logging::init_logging(&config.logging);
    match &config.source {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }
    if config.metrics.enabled {
        metrics::init_metrics();
    }

    let catalog = Arc::new(SportCatalog::standard());

    match cli.command {
        Commands::Serve { port } => {
            let store = storage::open_store(&config.storage)?;
            let state = AppState {
                submit: Arc::new(SubmitUseCase::new(store.clone(), catalog.clone())),
                admin: Arc::new(AdminUseCase::new(store, catalog)),
                metrics_enabled: config.metrics.enabled,
            };

            if let Some(port) = port {
                config.server.port = port;
            }
            let addr: SocketAddr = config
                .bind_address()
                .parse()
                .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;
            server::start_server(state, addr).await?;
        }
        Commands::Check { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let raw: RawSubmission = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a JSON submission", file.display()))?;

            let store = storage::open_store(&config.storage)?;
            let use_case = SubmitUseCase::new(store, catalog);
            match use_case.normalize_and_validate(&raw).await {
                Ok(registration) => {
                    println!("✅ Submission is valid");
                    println!("{}", serde_json::to_string_pretty(&registration)?);
                }
                Err(RegistrationError::Invalid(errors)) => {
                    println!("❌ Submission rejected ({} field errors):", errors.len());
                    for (field, error) in errors.iter() {
                        println!("   - {} [{}]: {}", field, error.kind, error.message);
                    }
                    anyhow::bail!("{} did not pass validation", file.display());
                }
                Err(e) => {
                    error!("Validation could not run: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Export {
            sport,
            year,
            gender,
            partner,
            output,
        } => {
            let filter = RegistrationFilter {
                sport,
                year,
                gender,
                status: None,
                partner,
            };
            let store = storage::open_store(&config.storage)?;
            let roster = AdminUseCase::new(store, catalog)
                .export_roster(&filter)
                .await?;
            let text = roster.render_text();

            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Roster written to {}", path.display());
                }
                None => print!("{}", text),
            }
        }
        Commands::Catalog => {
            let categories = catalog.categories();
            println!("Outdoor: {}", categories.outdoor.join(", "));
            for sport in &categories.indoor {
                println!("Indoor: {} ({})", sport.name, sport.variants.join(", "));
            }
            println!("Athletics: {}", categories.athletics.join(", "));
            println!("Fun activities: {}", categories.fun_activities.join(", "));
            println!();
            println!(
                "{} selectable sport ids: {}",
                catalog.sports_in_form_order().len(),
                catalog.sports_in_form_order().join(", ")
            );
            println!();
            println!("Partner required:");
            for sport in catalog.partner_sports() {
                println!("   - {} ({})", display_name(sport), sport);
            }
        }
    }
    Ok(())
}
