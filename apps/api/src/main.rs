use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use studysheet_api::config::Config;
use studysheet_api::routes::build_router;
use studysheet_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Studysheet API v{}", env!("CARGO_PKG_VERSION"));

    let layout = &config.default_layout;
    info!(
        "Default layout: {} {:?}, {} columns, {} text, {} pages",
        layout.page.paper_size.as_str(),
        layout.page.orientation,
        layout.page.columns,
        layout.text_size.as_str(),
        layout.max_pages
    );
    info!(
        "Request limits: {} blocks, {} topics, {} pages",
        config.max_blocks_per_request, config.max_topics_per_request, config.max_pages_per_request
    );

    // Build app state
    let state = AppState::new(config.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
