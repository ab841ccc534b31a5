use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

use urteil_api::config::read_config;
use urteil_api::domain::search::repository::SqliteCaseRepository;
use urteil_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = read_config()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect_with(settings.database.connect_options())
        .await?;

    let repository = SqliteCaseRepository::new(pool);
    // No search can run without the case tables; fail startup instead of
    // serving a dead API.
    repository.ensure_schema().await?;

    let state = AppState::new(repository, &settings);
    let app = router::create(state);

    let address = format!(
        "{}:{}",
        settings.application.host, settings.application.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "starting urteil-api");
    axum::serve(listener, app).await?;

    Ok(())
}
