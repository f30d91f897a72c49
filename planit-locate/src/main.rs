//! planit-locate - Photo Location Microservice
//!
//! **Module Identity:**
//! - Name: planit-locate
//! - Port: 5000 (default)
//!
//! Identifies where a photo was taken by fusing a Gemini recognition guess
//! with Google Places search results. Also serves the small browser helpers
//! (autocomplete proxy, MapTiler key) the PlanIt front end relies on.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use planit_common::config::{default_config_path, load_toml_config};
use planit_locate::config::ServiceConfig;
use planit_locate::fusion::LocationResolver;
use planit_locate::oracles::PlacesClient;
use planit_locate::AppState;

/// Filter used when neither RUST_LOG nor the TOML level parses
const DEFAULT_LOG_FILTER: &str = "planit_common=info,planit_locate=info,tower_http=info";

/// Command-line arguments for planit-locate
#[derive(Parser, Debug)]
#[command(name = "planit-locate")]
#[command(about = "Photo location microservice for PlanIt")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "PLANIT_BIND")]
    bind: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "PLANIT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path("planit-locate").context("Failed to locate config directory")?,
    };

    // The TOML file picks the final log level, so it is read under a
    // bootstrap subscriber that only honors RUST_LOG.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .finish();
    let toml_config = tracing::subscriber::with_default(bootstrap, || load_toml_config(&config_path))
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // RUST_LOG → TOML [logging] level → built-in filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting planit-locate (Photo Location) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let service = ServiceConfig::resolve(args.port, args.bind, &toml_config);
    info!(
        model = %service.fusion.recognition_model,
        place_types = ?service.fusion.place_types,
        "Fusion engine configured"
    );

    let places = match &service.fusion.search_api_key {
        Some(key) => Some(PlacesClient::new(key.clone()).context("Failed to create Places client")?),
        None => None,
    };

    let resolver = LocationResolver::from_config(service.fusion.clone())
        .context("Failed to initialize location resolver")?;

    let mut state = AppState::new(resolver)
        .with_maptiler_key(service.maptiler_api_key.clone())
        .with_max_body_bytes(service.max_body_bytes);
    if let Some(places) = places {
        state = state.with_places(places);
    }

    let app = planit_locate::build_router(state);

    let addr = format!("{}:{}", service.bind_address, service.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
