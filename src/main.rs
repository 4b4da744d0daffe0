mod config;
mod gemini;
mod markdown;
mod oracle;
mod pinecone;
mod server;

pub const USER_AGENT: &str = concat!("geeta/", env!("CARGO_PKG_VERSION"));

use config::Config;
use server::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geeta=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("starting geeta server");

    let state = AppState::initialize(&config)
        .await
        .inspect_err(|e| tracing::error!("failed to initialize upstream clients: {e}"))?;

    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");

    let app = server::router(state, &config.cors_origins);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
