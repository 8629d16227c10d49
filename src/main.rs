use std::{net::SocketAddr, sync::Arc};

use todo_api::{
    auth::SessionAuth,
    config::Config,
    database::{self, PgTodoStore},
    AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment from .env
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let pool = database::create_database_connection(&config).await?;
    database::run_migrations(&pool).await?;

    let state = AppState::new(
        Arc::new(PgTodoStore::new(pool.clone())),
        Arc::new(SessionAuth::new(pool, config.session_ttl)),
    );
    let app = todo_api::router(state, config.allowed_cors_origin.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
