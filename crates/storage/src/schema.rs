//! Lazy schema creation with versioned, additive-only upgrades.
//!
//! The `meta` table carries a `schema_version` marker; a stale marker triggers
//! the missing upgrade steps in order. Steps only ever ADD — existing columns
//! and data are never touched.

use sqlx::{Pool, Row, Sqlite};
use tracing::info;

pub(crate) const SCHEMA_VERSION: i64 = 3;

pub(crate) async fn ensure_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current = current_version(pool).await?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=SCHEMA_VERSION {
        apply_step(pool, version).await?;
        set_version(pool, version).await?;
        info!("Schema upgraded to version {}", version);
    }
    Ok(())
}

async fn current_version(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT value FROM meta WHERE key = 'schema_version'")
        .fetch_optional(pool)
        .await?;
    Ok(row
        .map(|r| r.get::<String, _>(0))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

async fn set_version(pool: &Pool<Sqlite>, version: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO meta (key, value) VALUES ('schema_version', ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(version.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

async fn apply_step(pool: &Pool<Sqlite>, version: i64) -> Result<(), sqlx::Error> {
    match version {
        1 => {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS reviews (
                    id                INTEGER PRIMARY KEY AUTOINCREMENT,
                    external_id       INTEGER UNIQUE,
                    page_id           INTEGER NOT NULL,
                    page_title        TEXT NOT NULL DEFAULT '',
                    author_name       TEXT NOT NULL DEFAULT '',
                    author_email      TEXT NOT NULL DEFAULT '',
                    author_ip         TEXT NOT NULL DEFAULT '',
                    body              TEXT NOT NULL DEFAULT '',
                    rating            INTEGER,
                    admin_response    TEXT NOT NULL DEFAULT '',
                    status            TEXT NOT NULL DEFAULT 'intake',
                    status_changed_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    metadata          TEXT,
                    submitted_at      DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    created_at        DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at        DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .execute(pool)
            .await?;
            sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_status ON reviews (status)")
                .execute(pool)
                .await?;
            sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_page ON reviews (page_id)")
                .execute(pool)
                .await?;
            sqlx::query(
                "CREATE INDEX IF NOT EXISTS idx_reviews_submitted ON reviews (submitted_at)",
            )
            .execute(pool)
            .await?;
        }
        2 => {
            // 图片列是后来加的
            sqlx::query("ALTER TABLE reviews ADD COLUMN images TEXT")
                .execute(pool)
                .await?;
        }
        3 => {
            sqlx::query("ALTER TABLE reviews ADD COLUMN flagged INTEGER NOT NULL DEFAULT 0")
                .execute(pool)
                .await?;
        }
        other => unreachable!("no schema step for version {other}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> Pool<Sqlite> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn creates_schema_and_records_version() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), SCHEMA_VERSION);

        // 再跑一次必须是幂等的
        ensure_schema(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn upgrades_from_v1_in_place() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        apply_step(&pool, 1).await.unwrap();
        set_version(&pool, 1).await.unwrap();

        sqlx::query("INSERT INTO reviews (page_id, page_title, body) VALUES (7, 'Pagina', 'oud')")
            .execute(&pool)
            .await
            .unwrap();

        ensure_schema(&pool).await.unwrap();

        // pre-upgrade row survives with defaults for the new columns
        let row = sqlx::query("SELECT flagged, images FROM reviews WHERE page_id = 7")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!row.get::<bool, _>(0));
        assert!(row.get::<Option<String>, _>(1).is_none());
    }
}
