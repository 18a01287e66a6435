//! Repository layer for database operations.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// Repository over the session-snapshot and entitlement tables.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Upsert the JSON document for a session key.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_snapshot(&self, key: &str, document: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO session_snapshots (session_key, document, saved_at)
            VALUES (?, ?, ?)
            ON CONFLICT(session_key) DO UPDATE SET
                document = excluded.document,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(key)
        .bind(document)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the stored JSON document for a session key, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn fetch_snapshot(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT document FROM session_snapshots WHERE session_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    /// Grant or revoke the entitlement for a key, with an optional expiry.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn set_entitlement(
        &self,
        key: &str,
        active: bool,
        expires_at_ms: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO entitlements (session_key, active, expires_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(session_key) DO UPDATE SET
                active = excluded.active,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(active as i64)
        .bind(expires_at_ms)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether the key holds an active, unexpired entitlement at `now_ms`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn entitlement_active(&self, key: &str, now_ms: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT active, expires_at FROM entitlements WHERE session_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(false);
        };
        let active: i64 = row.get(0);
        let expires_at: Option<i64> = row.get(1);
        Ok(active != 0 && expires_at.map_or(true, |exp| exp > now_ms))
    }
}
