//! HTTP surface of the books module.
//!
//! Write routes take a [`ValidatedBook`], so a payload that fails the schema
//! is answered with 400 before any repository call is made.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::AppError;
use serde_json::Value;

use super::models::{Book, BookListResponse, BookResponse, MessageResponse};
use super::repository::{BookRepository, RepositoryError};
use super::schema::{Schema, Violation};

/// Shared handler state, injected once at startup
#[derive(Clone)]
pub struct BooksState {
    pub repository: Arc<dyn BookRepository>,
    pub schema: Arc<Schema>,
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(state)
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(isbn) => {
                AppError::not_found(format!("There is no book with isbn '{}'", isbn))
            }
            RepositoryError::Conflict(isbn) => {
                AppError::conflict(format!("A book with isbn '{}' already exists", isbn))
            }
            RepositoryError::Persistence(e) => {
                AppError::Internal(anyhow::Error::new(e).context("book store failure"))
            }
        }
    }
}

fn invalid(violations: Vec<Violation>) -> AppError {
    AppError::validation(
        violations.iter().map(Violation::to_json).collect(),
        "Book failed validation",
    )
}

/// A request body that passed the book schema and was converted into a `Book`
pub struct ValidatedBook(pub Book);

impl FromRequest<BooksState> for ValidatedBook {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &BooksState) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<Value>::from_request(req, state).await?;

        state.schema.validate(&payload).map_err(invalid)?;

        let book = serde_json::from_value(payload)
            .map_err(|e| AppError::bad_request(format!("Book could not be decoded: {}", e)))?;
        Ok(ValidatedBook(book))
    }
}

async fn create_book(
    State(state): State<BooksState>,
    ValidatedBook(book): ValidatedBook,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = state.repository.create(book).await?;
    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

async fn list_books(
    State(state): State<BooksState>,
) -> Result<Json<BookListResponse>, AppError> {
    let books = state.repository.list().await?;
    Ok(Json(BookListResponse { books }))
}

async fn get_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = state.repository.get(&isbn).await?;
    Ok(Json(BookResponse { book }))
}

/// Full replacement. The key comes from the path; a payload isbn that differs
/// from it is rejected rather than treated as a rename.
async fn update_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
    ValidatedBook(book): ValidatedBook,
) -> Result<Json<BookResponse>, AppError> {
    if book.isbn != isbn {
        return Err(invalid(vec![Violation::immutable("isbn", &isbn, &book.isbn)]));
    }

    let book = state.repository.update(&isbn, book).await?;
    tracing::info!(isbn = %book.isbn, "book updated");
    Ok(Json(BookResponse { book }))
}

async fn delete_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.repository.delete(&isbn).await?;
    tracing::info!(isbn = %isbn, "book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}
