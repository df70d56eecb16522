//! Process wiring: open the store once, hand it to the modules, serve, and
//! release everything on shutdown.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use bookshelf_db::DbPool;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{
    self,
    books::repository::{BookRepository, InMemoryBookRepository, SqliteBookRepository},
};

/// Backing store for the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Store {
    #[default]
    Sqlite,
    /// Process-local; contents vanish on exit
    Memory,
}

/// Open the book store. The pool, when there is one, is returned so the
/// caller can close it on shutdown.
pub async fn open_store(
    settings: &Settings,
    store: Store,
) -> anyhow::Result<(Arc<dyn BookRepository>, Option<DbPool>)> {
    match store {
        Store::Sqlite => {
            let pool = bookshelf_db::connect(&settings.database)
                .await
                .with_context(|| "failed to open the book store")?;
            let repository: Arc<dyn BookRepository> =
                Arc::new(SqliteBookRepository::new(pool.clone()));
            Ok((repository, Some(pool)))
        }
        Store::Memory => {
            tracing::warn!("serving from the in-memory store; books are lost on exit");
            Ok((Arc::new(InMemoryBookRepository::new()), None))
        }
    }
}

pub fn build_registry(
    settings: &Settings,
    books: Arc<dyn BookRepository>,
) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings, books)?;
    Ok(registry)
}

/// The complete HTTP application over the given repository
pub fn build_router(settings: &Settings, books: Arc<dyn BookRepository>) -> anyhow::Result<Router> {
    let registry = build_registry(settings, books)?;
    Ok(bookshelf_http::build_router(&registry, settings))
}

/// Run the service until Ctrl-C or SIGTERM
pub async fn serve(settings: &Settings, store: Store) -> anyhow::Result<()> {
    let (books, pool) = open_store(settings, store).await?;
    let registry = build_registry(settings, books)?;
    let ctx = InitCtx { settings };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, settings, bookshelf_http::shutdown_signal()).await;

    let stopped = registry.stop_modules().await;
    if let Some(pool) = pool {
        bookshelf_db::close(pool).await;
    }

    served?;
    stopped
}

/// Apply every module migration to the configured database
pub async fn migrate(settings: &Settings) -> anyhow::Result<Vec<String>> {
    let pool = bookshelf_db::connect(&settings.database)
        .await
        .with_context(|| "failed to open database for migration")?;

    let registry = build_registry(
        settings,
        Arc::new(SqliteBookRepository::new(pool.clone())),
    )?;
    let migrations = registry.collect_migrations();
    tracing::info!(count = migrations.len(), "applying module migrations");

    let applied = bookshelf_db::apply_migrations(&pool, &migrations).await;
    bookshelf_db::close(pool).await;

    applied.with_context(|| "migration failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_is_idempotent_on_a_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.database.url = format!("sqlite://{}", dir.path().join("books.db").display());

        assert_eq!(migrate(&settings).await.unwrap(), vec!["books/001_init".to_string()]);
        assert!(migrate(&settings).await.unwrap().is_empty());

        let (books, pool) = open_store(&settings, Store::Sqlite).await.unwrap();
        assert!(books.list().await.unwrap().is_empty());
        bookshelf_db::close(pool.unwrap()).await;
    }

    #[tokio::test]
    async fn memory_store_has_no_pool() {
        let (books, pool) = open_store(&Settings::default(), Store::Memory).await.unwrap();
        assert!(pool.is_none());
        assert!(books.list().await.unwrap().is_empty());
    }
}
