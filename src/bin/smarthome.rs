use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use google_home::home_graph::{DeviceGraph, HomeGraph, ServiceAccountKey};
use smarthome::app::{AppState, router};
use smarthome::config::Config;
use smarthome::version::VERSION;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(err) = app().await {
        error!("Error: {err}");
        let mut cause = err.source();
        while let Some(c) = cause {
            error!("Cause: {c}");
            cause = c.source();
        }
        process::exit(1);
    }
}

async fn app() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(version = VERSION, "smarthome");

    let path = std::env::var("SMARTHOME_CONFIG")
        .unwrap_or_else(|_| format!("{}.toml", std::env!("CARGO_PKG_NAME")));
    let config = Config::build(&path)?;

    let home_graph: Option<Arc<dyn DeviceGraph>> = match &config.home_graph {
        Some(home_graph_config) => {
            let key = ServiceAccountKey::from_file(&home_graph_config.credentials)?;
            let mut home_graph = HomeGraph::new(&config.agent_user_id, key)?;
            if let Some(endpoint) = &home_graph_config.endpoint {
                home_graph = home_graph.with_endpoint(endpoint);
            }

            Some(Arc::new(home_graph))
        }
        None => {
            warn!("Home Graph is not configured, state will not be reported");
            None
        }
    };

    let app = router(AppState::new(&config, home_graph));

    // Start the web server
    let addr: SocketAddr = config.fulfillment.into();
    info!("Server started on http://{addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
