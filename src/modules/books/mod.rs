pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::BookRepository;
use routes::BooksState;
use schema::{book_schema, Schema};

/// DDL for the `books` table. Only the `migrate` command applies it.
pub const BOOKS_MIGRATIONS: &[Migration] = &[Migration {
    id: "001_init",
    up: r#"
        CREATE TABLE IF NOT EXISTS books (
            isbn       TEXT PRIMARY KEY NOT NULL,
            amazon_url TEXT NOT NULL,
            author     TEXT NOT NULL,
            language   TEXT NOT NULL,
            pages      INTEGER NOT NULL CHECK (pages >= 0),
            publisher  TEXT NOT NULL,
            title      TEXT NOT NULL,
            year       INTEGER NOT NULL
        );
        "#,
}];

/// The book catalog: one resource, five routes
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>, schema: Schema) -> Self {
        Self {
            state: BooksState {
                repository,
                schema: Arc::new(schema),
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            strict_schema = self.state.schema.strict,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_ref = json!({ "$ref": "#/components/schemas/Book" });
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let wrapped = |description: &str, key: &str, schema: serde_json::Value| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "object",
                            "properties": { key: schema },
                            "required": [key]
                        }
                    }
                }
            })
        };
        let isbn_param = json!([{
            "name": "isbn",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);
        let request_body = json!({
            "required": true,
            "content": { "application/json": { "schema": book_ref.clone() } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": wrapped("All books", "books", json!({ "type": "array", "items": book_ref.clone() })),
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": request_body.clone(),
                        "responses": {
                            "201": wrapped("Created book", "book", book_ref.clone()),
                            "400": error("Validation error"),
                            "409": error("A book with this isbn already exists"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/{isbn}": {
                    "get": {
                        "summary": "Fetch a book",
                        "tags": ["Books"],
                        "parameters": isbn_param.clone(),
                        "responses": {
                            "200": wrapped("The book", "book", book_ref.clone()),
                            "404": error("No book with this isbn"),
                            "500": error("Internal server error")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "parameters": isbn_param.clone(),
                        "requestBody": request_body,
                        "responses": {
                            "200": wrapped("Updated book", "book", book_ref.clone()),
                            "400": error("Validation error"),
                            "404": error("No book with this isbn"),
                            "500": error("Internal server error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": isbn_param,
                        "responses": {
                            "200": wrapped("Confirmation", "message", json!({ "type": "string" })),
                            "404": error("No book with this isbn"),
                            "500": error("Internal server error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": self.state.schema.to_json_schema()
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        BOOKS_MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over the given repository
pub fn create_module(repository: Arc<dyn BookRepository>, strict_schema: bool) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository, book_schema(strict_schema)))
}
