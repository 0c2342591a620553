use care_registry::config::AppConfig;
use care_registry::db::run_migrations;
use care_registry::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = config.db.connect().await?;
    run_migrations(&pool).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Care registry listening on http://{}", config.bind_addr);

    axum::serve(listener, app(AppState::new(pool))).await?;

    Ok(())
}
