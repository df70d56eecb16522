use bookshelf_db::DbPool;

use super::{BookRepository, RepositoryError};
use crate::modules::books::models::Book;

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

/// `BookRepository` over the `books` table of a SQLite pool.
#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait::async_trait]
impl BookRepository for SqliteBookRepository {
    async fn create(&self, book: Book) -> Result<Book, RepositoryError> {
        tracing::debug!(isbn = %book.isbn, "inserting book");

        let sql = format!(
            "INSERT INTO books ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(&book.isbn)
            .bind(&book.amazon_url)
            .bind(&book.author)
            .bind(&book.language)
            .bind(book.pages)
            .bind(&book.publisher)
            .bind(&book.title)
            .bind(book.year)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict(book.isbn.clone())
                } else {
                    RepositoryError::Persistence(e)
                }
            })
    }

    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM books");
        let books = sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = books.len(), "listed books");
        Ok(books)
    }

    async fn get(&self, isbn: &str) -> Result<Book, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM books WHERE isbn = ?");
        sqlx::query_as::<_, Book>(&sql)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }

    async fn update(&self, isbn: &str, book: Book) -> Result<Book, RepositoryError> {
        tracing::debug!(isbn = %isbn, "replacing book");

        let sql = format!(
            r#"
            UPDATE books SET
                amazon_url = ?, author = ?, language = ?, pages = ?,
                publisher = ?, title = ?, year = ?
            WHERE isbn = ?
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(&book.amazon_url)
            .bind(&book.author)
            .bind(&book.language)
            .bind(book.pages)
            .bind(&book.publisher)
            .bind(&book.title)
            .bind(book.year)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }

    async fn delete(&self, isbn: &str) -> Result<(), RepositoryError> {
        tracing::debug!(isbn = %isbn, "deleting book");

        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(isbn.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;
    use crate::modules::books::BOOKS_MIGRATIONS;

    async fn repo() -> SqliteBookRepository {
        let pool = bookshelf_db::connect_in_memory().await.unwrap();
        let migrations: Vec<_> = BOOKS_MIGRATIONS
            .iter()
            .cloned()
            .map(|m| ("books".to_string(), m))
            .collect();
        bookshelf_db::apply_migrations(&pool, &migrations)
            .await
            .unwrap();
        SqliteBookRepository::new(pool)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        contract::create_then_get_round_trips(&repo().await).await;
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        contract::duplicate_create_conflicts(&repo().await).await;
    }

    #[tokio::test]
    async fn list_returns_everything() {
        contract::list_returns_everything(&repo().await).await;
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        contract::update_replaces_fields(&repo().await).await;
    }

    #[tokio::test]
    async fn missing_keys_are_not_found() {
        contract::missing_keys_are_not_found(&repo().await).await;
    }

    #[tokio::test]
    async fn delete_removes_row() {
        contract::delete_removes_row(&repo().await).await;
    }

    #[tokio::test]
    async fn missing_table_surfaces_as_persistence_error() {
        let pool = bookshelf_db::connect_in_memory().await.unwrap();
        let repo = SqliteBookRepository::new(pool);

        assert!(matches!(
            repo.list().await,
            Err(RepositoryError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn isbn_is_bound_not_interpolated() {
        let repo = repo().await;
        repo.create(contract::book("1")).await.unwrap();

        assert!(matches!(
            repo.get("1' OR '1'='1").await,
            Err(RepositoryError::NotFound(_))
        ));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
