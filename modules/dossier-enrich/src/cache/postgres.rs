//! Postgres-backed cache store.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use super::{CacheStore, Namespace};

pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Delete expired entries. Returns the number of rows removed.
    pub async fn evict_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= now()",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<String>> {
        let payload = sqlx::query_scalar::<_, String>(
            "SELECT payload FROM cache_entries
             WHERE namespace = $1 AND cache_key = $2
               AND (expires_at IS NULL OR expires_at > now())",
        )
        .bind(ns.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload)
    }

    async fn set(&self, ns: Namespace, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at: DateTime<Utc> = Utc::now() + chrono::Duration::from_std(ttl)?;
        sqlx::query(
            "INSERT INTO cache_entries (namespace, cache_key, payload, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (namespace, cache_key)
             DO UPDATE SET payload = EXCLUDED.payload,
                          expires_at = EXCLUDED.expires_at,
                          created_at = now()",
        )
        .bind(ns.as_str())
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, ns: Namespace, key: &str) -> Result<bool> {
        // Expired rows get removed too, but only a live row counts as deleted.
        let live = sqlx::query_scalar::<_, bool>(
            "DELETE FROM cache_entries
             WHERE namespace = $1 AND cache_key = $2
             RETURNING (expires_at IS NULL OR expires_at > now())",
        )
        .bind(ns.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(live.unwrap_or(false))
    }

    async fn ping(&self) -> bool {
        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Cache database unreachable");
                false
            }
        }
    }
}
