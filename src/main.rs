use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saferoute::api::{self, AppState};
use saferoute::config::Config;
use saferoute::graph::NavigationGraph;
use saferoute::visibility::VisibilityEstimator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("saferoute=info".parse()?))
        .init();

    let config = Config::from_env();

    let nav_graph = NavigationGraph::from_pbf(&config.pbf_path)
        .with_context(|| format!("failed to load road graph from {}", config.pbf_path.display()))?;

    let visibility = VisibilityEstimator::new(&config.image_path);
    tracing::info!(image = %visibility.image_path().display(), "visibility image");

    let state = Arc::new(AppState {
        nav_graph,
        visibility,
        max_radius_m: config.max_radius_m,
    });

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
