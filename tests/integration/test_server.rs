use resource_hub::config::Config;
use resource_hub::handlers;
use resource_hub::AppState;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// A live API server on a random local port, seeded with the demo catalog.
/// The server task ends with the test runtime.
pub struct TestServer {
    pub base_url: String,
    pub state: Arc<AppState>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let state = AppState::from_config(config.clone()).unwrap();

        // Bind to random port
        let (addr, server) =
            handlers::bind(config.socket_addr(), state.clone(), std::future::pending()).unwrap();

        tokio::spawn(async move {
            if let Err(e) = server.await {
                eprintln!("test server error: {}", e);
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn test_config() -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        ..Config::default()
    }
}
