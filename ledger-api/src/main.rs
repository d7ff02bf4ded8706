//! Ledger - account ledger over HTTP

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_api::{create_router, AppState};
use ledger_core::config::Config;
use ledger_core::domain::CreateAccountRequest;
use ledger_core::LedgerContext;
use tracing::{error, info};

mod logging;

/// Ledger - account ledger over HTTP
#[derive(Parser)]
#[command(name = "ledger", version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = "settings.json")]
    config: PathBuf,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long)]
        listen: Option<String>,
        /// Database file
        #[arg(long, conflicts_with = "in_memory")]
        database: Option<PathBuf>,
        /// Use a throwaway in-memory database
        #[arg(long)]
        in_memory: bool,
        /// Create a demo account before serving
        #[arg(long)]
        seed: bool,
    },

    /// Write a settings file with the current configuration
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logger(cli.log_json) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Serve { listen, database, in_memory, seed } => {
            if let Some(listen) = listen {
                config.listen_addr = listen;
            }
            if database.is_some() {
                config.database_path = database;
            }
            if in_memory {
                config.database_path = None;
            }
            serve(config, seed)
        }
        Commands::Init => {
            config.save(&cli.config)?;
            info!(path = %cli.config.display(), "settings written");
            Ok(())
        }
    }
}

fn serve(config: Config, seed: bool) -> Result<()> {
    info!(?config, "starting");
    let context = LedgerContext::new(config)?;

    if seed {
        seed_accounts(&context)?;
    }

    let listen_addr = context.config.listen_addr.clone();
    let timeout = Duration::from_secs(context.config.request_timeout_secs);
    let app = create_router(AppState::from_context(&context), timeout);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("binding {}", listen_addr))?;
        info!(addr = %listen_addr, "server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("server stopped");
        Ok::<_, anyhow::Error>(())
    })
}

fn seed_accounts(context: &LedgerContext) -> Result<()> {
    let created = context.account_service.create_account(&CreateAccountRequest {
        email: "johndoe".to_string(),
        password: Some("securepassword123".to_string()),
    })?;
    info!(
        id = created.account.id,
        number = created.account.number,
        email = %created.account.email,
        "seeded account"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
