mod headless;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;

use chat_sync_client::common::SyncEvent;
use chat_sync_client::config::{self, AppConfig};
use chat_sync_client::conversation::ConversationCache;
use chat_sync_client::network::{Gateway, HttpTransport, SyncClient};
use chat_sync_client::session::SessionStore;
use chat_sync_client::storage::{self, ClientDatabase};
use chat_sync_client::ui::ChatApp;
use headless::Mode;

#[derive(Parser)]
#[command(
    name = "chat_sync_client",
    version,
    about = "Chat client for the scripted bot backend"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Backend base URL (overrides config file and CHAT_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = resolve_config(&cli);

    storage::ensure_data_dir(&app_config.data_dir)?;
    let database = ClientDatabase::with_path(app_config.database_path())?;
    let session = SessionStore::restore(Arc::new(database));
    let transport = Arc::new(HttpTransport::new(&app_config.api_base_url)?);
    let gateway = Gateway::new(transport, session.clone()).with_timeout(app_config.request_timeout());

    match cli.mode {
        Some(mode) => {
            let gateway = gateway.on_unauthorized(|| {
                eprintln!("Session expired; run `login` again.");
            });
            headless::run(mode, gateway).await?;
            Ok(())
        }
        None => run_full_client(gateway, session).await,
    }
}

fn resolve_config(cli: &Cli) -> AppConfig {
    if !Path::new(&cli.config).exists() {
        if let Err(err) = config::save_config(&cli.config, &AppConfig::default()) {
            log::warn!("Unable to create {}: {err}", cli.config);
        }
    }

    let mut app_config = config::load_config(&cli.config).with_env_overrides();
    if let Some(url) = &cli.api_url {
        app_config.api_base_url = url.clone();
    }
    log::info!("Using backend at {}", app_config.api_base_url);
    app_config
}

async fn run_full_client(gateway: Gateway, session: SessionStore) -> Result<(), Box<dyn Error>> {
    // UI -> sync worker
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // sync worker -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let unauthorized_tx = event_tx.clone();
    let gateway = gateway.on_unauthorized(move || {
        if let Err(err) = unauthorized_tx.try_send(SyncEvent::Unauthorized) {
            log::warn!("Failed to notify UI about expired session: {err}");
        }
    });
    let cache = Arc::new(ConversationCache::new(gateway));

    tokio::spawn(async move {
        let client = SyncClient::new(cache, event_tx, cmd_rx);
        if let Err(err) = client.run().await {
            log::error!("Sync worker terminated: {err}");
        }
    });

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Chat",
        options,
        Box::new(move |cc| {
            log::info!(
                "Client started ({})",
                if session.is_authenticated() {
                    "restored session"
                } else {
                    "logged out"
                }
            );

            Ok(Box::new(ChatApp::new(cc, session, cmd_tx, event_rx)))
        }),
    )?;
    Ok(())
}
