// PostgreSQL script store with graceful degradation

use async_trait::async_trait;
use log::{error, info, warn};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use querydeck_utils::data::Script;

use super::models::{issued_id, row_key, ScriptRecord};
use crate::backends::{BackendError, BackendResult, ScriptBackend, ScriptDraft};

/// Script store backed by a `scripts` table.
///
/// Without a reachable database every call fails with
/// `BackendError::Unavailable`; the workspace keeps running and tabs stay
/// dirty.
pub struct PgScriptStore {
    pool: Option<PgPool>,
}

impl PgScriptStore {
    /// Connect and run migrations. Never fails: an absent URL, a refused
    /// connection or a failed migration all yield a disabled store.
    pub async fn connect(database_url: Option<String>) -> Self {
        let Some(url) = database_url else {
            info!("Querydeck: no DATABASE_URL provided, script store disabled");
            return Self { pool: None };
        };

        let pool = match PgPoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&url)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Querydeck: failed to connect to PostgreSQL: {}", e);
                warn!("Querydeck: continuing without a script store");
                return Self { pool: None };
            }
        };

        info!("Querydeck: PostgreSQL connection pool established");
        match sqlx::migrate!("./migrations").run(&pool).await {
            Ok(_) => info!("Querydeck: database migrations applied successfully"),
            Err(e) => {
                error!("Querydeck: migration failed: {}", e);
                warn!("Querydeck: continuing without a script store");
                return Self { pool: None };
            }
        }

        Self { pool: Some(pool) }
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> BackendResult<&PgPool> {
        self.pool
            .as_ref()
            .ok_or_else(|| BackendError::Unavailable("no database pool".to_string()))
    }
}

#[async_trait]
impl ScriptBackend for PgScriptStore {
    async fn save(&self, draft: &ScriptDraft) -> BackendResult<u64> {
        let raw: i64 = sqlx::query_scalar(
            "INSERT INTO scripts (name, query_text, connection_id, description)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.content)
        .bind(&draft.connection_id)
        .bind(&draft.description)
        .fetch_one(self.pool()?)
        .await?;

        issued_id(raw)
    }

    async fn update(&self, id: u64, draft: &ScriptDraft) -> BackendResult<()> {
        let result = sqlx::query(
            "UPDATE scripts
             SET name = $1, query_text = $2, connection_id = $3, description = $4, updated_at = NOW()
             WHERE id = $5",
        )
        .bind(&draft.name)
        .bind(&draft.content)
        .bind(&draft.connection_id)
        .bind(&draft.description)
        .bind(row_key(id)?)
        .execute(self.pool()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BackendError::ScriptNotFound(id));
        }
        Ok(())
    }

    async fn remove(&self, id: u64) -> BackendResult<()> {
        let result = sqlx::query("DELETE FROM scripts WHERE id = $1")
            .bind(row_key(id)?)
            .execute(self.pool()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BackendError::ScriptNotFound(id));
        }
        Ok(())
    }

    async fn list(&self) -> BackendResult<Vec<Script>> {
        let records = sqlx::query_as::<_, ScriptRecord>(
            "SELECT id, name, query_text, connection_id, description, tags, created_at, updated_at, favorite
             FROM scripts ORDER BY id",
        )
        .fetch_all(self.pool()?)
        .await?;

        let mut scripts = Vec::with_capacity(records.len());
        for record in records {
            match Script::try_from(record) {
                Ok(script) => scripts.push(script),
                Err(e) => warn!("Querydeck: skipping script row: {}", e),
            }
        }
        Ok(scripts)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_without_db_gracefully_degrades() {
        let store = PgScriptStore::connect(None).await;
        assert!(!store.is_available());

        let draft = ScriptDraft {
            name: "orders".to_string(),
            content: "SELECT 1;".to_string(),
            connection_id: None,
            description: None,
        };
        assert!(matches!(store.save(&draft).await, Err(BackendError::Unavailable(_))));
        assert!(matches!(store.list().await, Err(BackendError::Unavailable(_))));
        assert!(matches!(store.remove(1).await, Err(BackendError::Unavailable(_))));
    }
}
