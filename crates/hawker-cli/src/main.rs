//! Server entry point - the composition root.
//!
//! Settings come from the environment (`HAWKER_*`, with `.env` support);
//! flags override the port and static directory for quick local runs.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hawker_axum::{start_server, CorsConfig, HawkerDeps};
use hawker_core::ports::MemProductStore;
use hawker_core::settings::Settings;
use hawker_tts::DoubaoTtsService;

#[derive(Parser)]
#[command(name = "hawker", about = "Hawking scheduler service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP/WebSocket server.
    Serve {
        /// Port to listen on (overrides HAWKER_PORT).
        #[arg(long)]
        port: Option<u16>,

        /// Static root directory (overrides HAWKER_STATIC_DIR).
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG wins, info is the default.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables from a local .env, if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();

    let Some(Commands::Serve { port, static_dir }) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(static_dir) = static_dir {
        settings.server.static_dir = static_dir;
    }

    if settings.tts.access_token.is_empty() {
        tracing::warn!("HAWKER_TTS_ACCESS_TOKEN is not set; synthesis calls will fail upstream");
    }

    let tts = Arc::new(DoubaoTtsService::new(
        settings.tts.clone(),
        settings.server.audio_root(),
    ));

    // Products are owned by the host's CRUD layers; this standalone
    // binary keeps them in memory and expects the client to push its
    // catalogue via POST /api/v1/products/sync after connecting.
    let deps = HawkerDeps {
        products: Arc::new(MemProductStore::new()),
        tts,
    };

    start_server(settings, deps, CorsConfig::AllowAll).await
}
