//! Server bootstrap — the composition root.
//!
//! This is the only place where infrastructure is wired together: the
//! hub loop is started, the intro catalogue pre-warmed, and the
//! scheduler assembled from its ports. The product store and the
//! synthesizer are injected via [`HawkerDeps`] so tests and alternate
//! hosts can swap them without touching the wiring.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use hawker_core::catalogue::{prewarm_intros, IntroCatalogue};
use hawker_core::ports::{AudioSynthesizer, EventBroadcaster, ProductStore};
use hawker_core::settings::Settings;
use hawker_core::HawkingScheduler;

use crate::hub::Hub;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Injected port implementations.
pub struct HawkerDeps {
    pub products: Arc<dyn ProductStore>,
    pub tts: Arc<dyn AudioSynthesizer>,
}

/// All initialized services the handlers need.
pub struct AxumContext {
    pub scheduler: Arc<HawkingScheduler>,
    pub hub: Arc<Hub>,
    pub catalogue: Arc<IntroCatalogue>,
    pub products: Arc<dyn ProductStore>,
    pub settings: Settings,
}

/// Bootstrap the service: start the hub, pre-warm the intro catalogue
/// (synthesizing missing opener audio and reaping stale fingerprints)
/// and assemble the scheduler.
pub async fn bootstrap(settings: Settings, deps: HawkerDeps) -> Result<AxumContext> {
    let audio_root = settings.server.audio_root();
    std::fs::create_dir_all(&audio_root)?;

    info!(
        port = settings.server.port,
        static_dir = %settings.server.static_dir.display(),
        audio_root = %audio_root.display(),
        "bootstrap resolved paths"
    );

    let hub = Arc::new(Hub::new());

    let catalogue = Arc::new(IntroCatalogue::new());
    prewarm_intros(&catalogue, &deps.tts, &audio_root).await;

    let scheduler = Arc::new(HawkingScheduler::new(
        Arc::clone(&deps.products),
        Arc::clone(&catalogue),
        Arc::clone(&deps.tts),
        Arc::clone(&hub) as Arc<dyn EventBroadcaster>,
        audio_root,
        settings.effective_default_voice(),
    ));

    Ok(AxumContext {
        scheduler,
        hub,
        catalogue,
        products: deps.products,
        settings,
    })
}

/// Bootstrap and serve until the process is stopped.
pub async fn start_server(settings: Settings, deps: HawkerDeps, cors: CorsConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let port = settings.server.port;
    let ctx = bootstrap(settings, deps).await?;
    let app = crate::routes::create_router(ctx, &cors);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("hawker server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
