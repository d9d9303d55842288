//! Wayfarer application binary - composition root.
//!
//! 1. Parse the CLI and load configuration from TOML, then the environment
//! 2. Open storage (SQLite) and the local contact file
//! 3. Build the providers, the tool registry and the alert service
//! 4. Serve the HTTP API and chat socket, or chat in the terminal

mod cli;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wayfarer_api::routes;
use wayfarer_api::state::AppState;
use wayfarer_chat::{ChatCompletionsClient, SessionStore, TravelOrchestrator};
use wayfarer_core::{Gazetteer, LocationNormalizer, WayfarerConfig};
use wayfarer_sos::{channel_from_config, LocalContactFile, SosService};
use wayfarer_storage::{ContactRepository, Database, LocationRepository};
use wayfarer_tools::{Providers, ToolRegistry};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config: file, then credentials from the environment, then CLI overrides.
    let config_file = args.resolve_config_path();
    let mut config = WayfarerConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    config.general.port = args.resolve_port(config.general.port);
    config.general.data_dir = args.resolve_data_dir(&config.general.data_dir);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing: RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Wayfarer v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let data_dir = cli::expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let (db, db_path) = Database::open_in(&data_dir)?;
    let db = Arc::new(db);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Emergency alerts: SQLite first, local JSON file as the fallback store.
    let contacts_path = cli::resolve_in_data_dir(&data_dir, &config.sos.contacts_file);
    let sos = Arc::new(
        SosService::new(
            Arc::new(ContactRepository::new(Arc::clone(&db))),
            Arc::new(LocalContactFile::new(&contacts_path)),
            channel_from_config(&config.sos),
        )
        .with_send_delay(Duration::from_millis(config.sos.send_delay_ms)),
    );
    tracing::info!(path = %contacts_path.display(), "Emergency contacts ready");

    // Tools. A provider that fails to build leaves its tools reporting
    // "not configured" instead of stopping the process.
    let providers = match Providers::from_config(&config.services) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "External providers unavailable, tools will report it");
            Providers::default()
        }
    };
    tracing::info!(configured = ?providers.configured(), "Providers ready");
    let normalizer = Arc::new(LocationNormalizer::with_threshold(
        Gazetteer::default(),
        config.chat.correction_threshold,
    ));
    let registry = ToolRegistry::new(providers, normalizer).with_sos(Arc::clone(&sos));

    // Language model. A missing key surfaces per turn as the fallback reply.
    let model = ChatCompletionsClient::from_config(&config.llm)?;
    if config.llm.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set, chat turns will fall back");
    }
    tracing::info!(model = %model.model(), "Language model client ready");

    let orchestrator = TravelOrchestrator::new(
        Arc::new(model),
        registry,
        Arc::new(SessionStore::new()),
    )
    .with_max_message_length(config.chat.max_message_length);

    match args.command() {
        Command::Serve => {
            let state = AppState::new(
                config.clone(),
                orchestrator,
                sos,
                LocationRepository::new(db),
            );
            tracing::info!(port = config.general.port, "Chat socket at /ws/{{user_id}}");
            routes::start_server(&config, state).await?;
        }
        Command::Chat { user } => {
            let repl = repl::Repl::new(&orchestrator, &sos, user);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            repl.run(stdin, &mut stdout).await?;
        }
    }

    Ok(())
}
