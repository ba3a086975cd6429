use taskvault_lib::{config::Settings, db, routes, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration first so the log level is honored.
    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    // Connect the pool and make sure the schema exists.
    let pool = db::connect(&settings).await?;
    db::init_schema(&pool).await?;

    let bind_addr = settings.bind_addr;
    let state = AppState::new(pool, settings);
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
