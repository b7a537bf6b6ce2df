use sqlx::SqlitePool;

/// Single-table key-value store backing the visitor register.
#[derive(Clone)]
pub struct KvStore {
    db: SqlitePool,
}

impl KvStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Raw bytes stored under `key`. Values are read as blobs so that a row
    /// holding invalid text still comes back for the caller to reject.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT CAST(value AS BLOB) FROM kv_store WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.db)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Overwrite the value stored under `key` in a single statement.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
