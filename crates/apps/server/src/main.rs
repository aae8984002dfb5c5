use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use streaming::{DEFAULT_SESSION_CAPACITY, MemorySessionStore, SessionLocks};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod routes;

use config::ServerConfig;
use routes::{AppState, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = env::var("POI_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9200".to_string())
        .parse()?;
    let config_path =
        PathBuf::from(env::var("POI_CONFIG").unwrap_or_else(|_| "layers.json".to_string()));
    let capacity = env_var_usize("POI_SESSION_CAPACITY", DEFAULT_SESSION_CAPACITY);

    let config = ServerConfig::load(&config_path).inspect_err(|err| error!("{err}"))?;
    let base = config_path.parent().unwrap_or(Path::new(""));
    let layers = config
        .build_layers(
            base,
            Arc::new(MemorySessionStore::new(capacity)),
            Arc::new(SessionLocks::default()),
        )
        .inspect_err(|err| error!("{err}"))?;
    info!(
        "serving layers [{}] with room for {capacity} sessions",
        layers.names().collect::<Vec<_>>().join(", ")
    );

    let app = router(AppState {
        layers: Arc::new(layers),
    });

    info!("poi server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
