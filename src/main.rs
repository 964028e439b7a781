use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use relaybot::cli::{Cli, Commands};
use relaybot::core::{init_logger, install_panic_hook, Config};
use relaybot::storage::{create_storage_client, RemoteDestination, StorageClient};
use relaybot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use relaybot::transfer::{store_and_link, ChatTransport, TransferOutcome, TransferWorkflow};

/// Main entry point for the relay bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    install_panic_hook();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = Config::from_env()?;
    init_logger(&config.log_file_path)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot(config).await,
        Some(Commands::Upload { file, name }) => run_cli_upload(config, file, name).await,
        Some(Commands::EnsureDestination) => run_ensure_destination(config).await,
    }
}

/// Ensures the destination once and logs the result. A failure is not fatal:
/// each upload tries again.
async fn ensure_destination(storage: &dyn StorageClient, prefix: &str) {
    match storage.ensure_destination_ready(prefix).await {
        Ok(status) => log::info!("Destination {} on {}: {:?}", prefix, storage.backend_name(), status),
        Err(e) => log::warn!("Could not ensure destination {} on {}: {}", prefix, storage.backend_name(), e),
    }
}

async fn run_bot(config: Config) -> Result<()> {
    log::info!(
        "Starting relay bot (backend: {:?}, mode: {:?}, prefix: {})",
        config.storage_backend,
        config.relay_mode,
        config.destination_prefix
    );

    let storage = create_storage_client(&config)?;
    ensure_destination(storage.as_ref(), &config.destination_prefix).await;

    tokio::fs::create_dir_all(&config.temp_dir).await?;

    let bot = create_bot(&config)?;
    let transport: Arc<dyn ChatTransport> = Arc::new(bot.clone());
    let workflow = Arc::new(TransferWorkflow::new(
        storage,
        transport,
        config.destination_prefix.clone(),
        config.temp_dir.clone(),
        config.relay_mode,
    ));

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let handler = schema(HandlerDeps::new(workflow));
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    log::info!("Bot started, waiting for documents");
    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// Pushes a local file through ensure → upload → link and prints the link
async fn run_cli_upload(config: Config, file: PathBuf, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Cannot derive a remote name from {}", file.display()))?,
    };
    if !file.is_file() {
        return Err(anyhow::anyhow!("{} is not a file", file.display()));
    }

    let storage = create_storage_client(&config)?;
    let destination = RemoteDestination::new(&config.destination_prefix, &name);

    match store_and_link(storage.as_ref(), &file, &destination).await {
        TransferOutcome::PublicLink(url) => {
            println!("{}", url);
            Ok(())
        }
        outcome => Err(anyhow::anyhow!("Upload of {} did not produce a link: {}", file.display(), outcome)),
    }
}

async fn run_ensure_destination(config: Config) -> Result<()> {
    let storage = create_storage_client(&config)?;
    let status = storage
        .ensure_destination_ready(&config.destination_prefix)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure {}: {}", config.destination_prefix, e))?;
    println!("{}: {:?}", config.destination_prefix, status);
    Ok(())
}
