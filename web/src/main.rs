use anyhow::{Context, Result};
use axum::{Router, response::Html, routing::get};
use clap::Parser;
use state::{AppState, SharedState};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::filter::EnvFilter;

mod api;
mod config;
mod error;
mod state;

const API_PREFIX: &str = "/api/v1";

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the yaml configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// The name of the environment to load from the configuration file
    #[arg(short, long, default_value = "dev")]
    pub env: String,
}

/// Build the application router for the given state
pub(crate) fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest(API_PREFIX, api::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("SAMPLEWEB_LOG"))
        .init();
    let args = Cli::parse();
    let config_file = match args.config {
        Some(path) => path,
        None => config::default_config_file()?,
    };
    let env = config::load_config(&config_file, &args.env).await?;
    debug!("using database '{}'", env.database);

    let shared_state = Arc::new(SharedState::new(env).await?);
    let listen = &shared_state.config.listen;
    let addr: SocketAddr = format!("{}:{}", listen.host, listen.port)
        .parse()
        .with_context(|| "Invalid listen address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app(shared_state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shared_state.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

async fn root() -> Html<String> {
    Html(format!("sampleweb is running. The API is at {API_PREFIX}"))
}
