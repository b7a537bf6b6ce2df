use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Open the SQLite pool behind `database_url` and bring its schema up to date.
pub async fn init_pool(database_url: &str) -> SqlitePool {
    // File-backed databases need their directory to exist
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        if !path.starts_with(":memory:") {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .expect("Invalid database URL")
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to connect to database");

    migrate(&pool).await.expect("Failed to run migrations");
    tracing::info!("Database ready at {database_url}");

    pool
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
