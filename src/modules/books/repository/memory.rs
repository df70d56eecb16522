use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::{BookRepository, RepositoryError};
use crate::modules::books::models::Book;

/// Process-local store with the same semantics as the SQLite repository.
/// Books are listed in isbn order.
#[derive(Default)]
pub struct InMemoryBookRepository {
    books: RwLock<BTreeMap<String, Book>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn create(&self, book: Book) -> Result<Book, RepositoryError> {
        let mut books = self.books.write().await;
        if books.contains_key(&book.isbn) {
            return Err(RepositoryError::Conflict(book.isbn));
        }
        books.insert(book.isbn.clone(), book.clone());
        Ok(book)
    }

    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn get(&self, isbn: &str) -> Result<Book, RepositoryError> {
        self.books
            .read()
            .await
            .get(isbn)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }

    async fn update(&self, isbn: &str, book: Book) -> Result<Book, RepositoryError> {
        let mut books = self.books.write().await;
        let stored = books
            .get_mut(isbn)
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))?;
        *stored = Book {
            isbn: isbn.to_string(),
            ..book
        };
        Ok(stored.clone())
    }

    async fn delete(&self, isbn: &str) -> Result<(), RepositoryError> {
        self.books
            .write()
            .await
            .remove(isbn)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }
}
