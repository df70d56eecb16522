//! SQLite connection pool factory and module migration runner.
//!
//! The pool is created once at startup and handed to whoever needs it; nothing
//! here keeps a process-wide handle.

use std::str::FromStr;

use bookshelf_kernel::{settings::DatabaseSettings, Migration};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use thiserror::Error;

/// Database connection pool
pub type DbPool = Pool<Sqlite>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("invalid database url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to connect to '{url}'")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration {module}/{id} failed")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Query(#[from] sqlx::Error),
}

/// Establishes a connection pool from settings
pub async fn connect(settings: &DatabaseSettings) -> Result<DbPool, DbError> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .map_err(|source| DbError::InvalidUrl {
            url: settings.url.clone(),
            source,
        })?
        .create_if_missing(settings.create_if_missing)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await
        .map_err(|source| DbError::Connect {
            url: settings.url.clone(),
            source,
        })?;

    tracing::info!(
        target: "bookshelf-db",
        url = %settings.url,
        max_connections = settings.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Creates a single-connection in-memory database.
///
/// Every connection to `sqlite::memory:` sees its own database, so the pool is
/// pinned to one connection that never idles out.
pub async fn connect_in_memory() -> Result<DbPool, DbError> {
    let url = "sqlite::memory:";
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|source| DbError::InvalidUrl {
            url: url.to_string(),
            source,
        })?
        .journal_mode(SqliteJournalMode::Memory);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|source| DbError::Connect {
            url: url.to_string(),
            source,
        })
}

/// Closes the database connection pool
pub async fn close(pool: DbPool) {
    pool.close().await;
    tracing::info!(target: "bookshelf-db", "database pool closed");
}

/// Applies module migrations that have not been recorded yet.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row. Returns the `module/id` names that were applied by this call.
pub async fn apply_migrations(
    pool: &DbPool,
    migrations: &[(String, Migration)],
) -> Result<Vec<String>, DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            module TEXT NOT NULL,
            id TEXT NOT NULL,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (module, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    let mut applied = Vec::new();

    for (module, migration) in migrations {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM schema_migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await?;

        if existing.is_some() {
            tracing::debug!(target: "bookshelf-db", module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let to_migration_error = |source| DbError::Migration {
            module: module.clone(),
            id: migration.id.to_string(),
            source,
        };

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(to_migration_error)?;
        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .map_err(to_migration_error)?;
        tx.commit().await?;

        tracing::info!(target: "bookshelf-db", module = %module, id = migration.id, "migration applied");
        applied.push(format!("{}/{}", module, migration.id));
    }

    Ok(applied)
}
