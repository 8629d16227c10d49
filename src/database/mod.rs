use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::Config;

pub mod auth;
pub mod todos;

pub use auth::AuthRepository;
pub use todos::{PgTodoStore, TodoStore};

pub type Database = PgPool;

pub async fn create_database_connection(config: &Config) -> Result<Database, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connected successfully");
    Ok(pool)
}

pub async fn run_migrations(pool: &Database) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations executed successfully");
    Ok(())
}

pub async fn ping(pool: &Database) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
