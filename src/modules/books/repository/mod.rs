//! Persistence boundary for books.
//!
//! Every operation is a single statement against current store state; nothing
//! is cached between calls.

pub use memory::InMemoryBookRepository;
pub use sqlite::SqliteBookRepository;

use super::models::Book;

mod memory;
mod sqlite;

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("book {0} not found")]
    NotFound(String),

    #[error("book {0} already exists")]
    Conflict(String),

    #[error("store failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Inserts a new book; `Conflict` when the isbn is taken
    async fn create(&self, book: Book) -> Result<Book, RepositoryError>;

    /// All books in store order
    async fn list(&self) -> Result<Vec<Book>, RepositoryError>;

    async fn get(&self, isbn: &str) -> Result<Book, RepositoryError>;

    /// Replaces every non-key field of the book stored under `isbn`
    async fn update(&self, isbn: &str, book: Book) -> Result<Book, RepositoryError>;

    async fn delete(&self, isbn: &str) -> Result<(), RepositoryError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every `BookRepository` implementation must share.

    use super::*;

    pub fn book(isbn: &str) -> Book {
        Book {
            isbn: isbn.to_string(),
            amazon_url: "http://a.co/eobPtX2".to_string(),
            author: "Matthew Lane".to_string(),
            language: "english".to_string(),
            pages: 264,
            publisher: "Princeton University Press".to_string(),
            title: "Power-Up: Unlocking the Hidden Mathematics in Video Games".to_string(),
            year: 2017,
        }
    }

    pub async fn create_then_get_round_trips(repo: &dyn BookRepository) {
        let created = repo.create(book("0691161518")).await.unwrap();
        assert_eq!(created, book("0691161518"));
        assert_eq!(repo.get("0691161518").await.unwrap(), book("0691161518"));
    }

    pub async fn duplicate_create_conflicts(repo: &dyn BookRepository) {
        repo.create(book("0691161518")).await.unwrap();

        let err = repo.create(book("0691161518")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(isbn) if isbn == "0691161518"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    pub async fn list_returns_everything(repo: &dyn BookRepository) {
        assert!(repo.list().await.unwrap().is_empty());

        repo.create(book("1")).await.unwrap();
        repo.create(book("2")).await.unwrap();

        let mut isbns: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.isbn)
            .collect();
        isbns.sort();
        assert_eq!(isbns, vec!["1", "2"]);
    }

    pub async fn update_replaces_fields(repo: &dyn BookRepository) {
        repo.create(book("1101965886")).await.unwrap();

        let mut replacement = book("1101965886");
        replacement.year = 1998;
        replacement.title = "A Knight of the Seven Kingdoms".to_string();

        let updated = repo.update("1101965886", replacement.clone()).await.unwrap();
        assert_eq!(updated, replacement);
        assert_eq!(repo.get("1101965886").await.unwrap(), replacement);
    }

    pub async fn missing_keys_are_not_found(repo: &dyn BookRepository) {
        assert!(matches!(
            repo.get("11019658").await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.update("11019658", book("11019658")).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete("11019658").await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(repo.list().await.unwrap().is_empty());
    }

    pub async fn delete_removes_row(repo: &dyn BookRepository) {
        repo.create(book("1101965886")).await.unwrap();
        repo.delete("1101965886").await.unwrap();

        assert!(matches!(
            repo.get("1101965886").await,
            Err(RepositoryError::NotFound(isbn)) if isbn == "1101965886"
        ));
    }
}
