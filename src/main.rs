use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dashgen::config::AppConfig;
use dashgen::llm::OpenAiGateway;
use dashgen::shared::state::AppState;
use dashgen::store::RemoteDashboardStore;
use dashgen::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dashgen=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let llm = Arc::new(OpenAiGateway::new(&config.llm));
    let store = Arc::new(RemoteDashboardStore::new(&config.store));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, llm, store));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("dashgen listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
