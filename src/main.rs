use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chess_model_api::{
    config::ServerConfig,
    fetch::ensure_model,
    model::{ChessLm, SamplingConfig},
    server::{AppState, router},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();

    // Generation runs on the blocking pool later; the session is built
    // there too since ORT graph optimization can take a while.
    let model_path = config.model_path.clone();
    let model_url = config.model_url.clone();
    let model = tokio::task::spawn_blocking(move || -> anyhow::Result<ChessLm> {
        ensure_model(&model_path, &model_url).context("fetching model export")?;
        ChessLm::from_file(&model_path).context("loading model export")
    })
    .await??;
    info!(model = %config.model_path, "model session initialized");

    let state = AppState::new(
        Box::new(model),
        SamplingConfig::default(),
        config.model_path.clone(),
        config.allow_origins.clone(),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, router(state))
        .await
        .context("serving")?;
    Ok(())
}
