//! SQLite connection pool factory and migration runner.

use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Shared handle to the database pool.
///
/// Cloning is cheap; every clone points at the same pool.
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Connect to the database at `url`, creating the file if it does not exist.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to database '{url}'"))?;

        tracing::info!(target: "bookshelf-db", %url, max_connections, "database pool ready");
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("failed to open in-memory database")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query to check the database is reachable.
    pub async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }

    /// Apply every migration not yet recorded in `_migrations`.
    ///
    /// Each migration runs in its own transaction together with its
    /// bookkeeping row. Returns the number of migrations applied.
    pub async fn migrate(&self, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        sqlx::raw_sql(MIGRATIONS_TABLE)
            .execute(&self.pool)
            .await
            .context("failed to create migrations table")?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let seen: Option<(String,)> =
                sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(&self.pool)
                    .await
                    .context("failed to read migrations table")?;

            if seen.is_some() {
                tracing::debug!(target: "bookshelf-db", %module, id = migration.id, "migration already applied");
                continue;
            }

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration '{module}/{}' failed", migration.id))?;
            sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(target: "bookshelf-db", %module, id = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }
}
