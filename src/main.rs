use resource_hub::config::Config;
use resource_hub::handlers;
use resource_hub::state::AppState;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting resource hub");

    let config = Config::load()?;
    let addr = config.socket_addr();
    let state = AppState::from_config(config)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let (bound, server) = handlers::bind(addr, state, shutdown)?;
    info!("Listening on http://{}", bound);

    server.await?;
    info!("Server stopped");
    Ok(())
}
