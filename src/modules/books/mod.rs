pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::BookRepository;

/// Book catalogue: CRUD over the `book` table, mounted at `/books`
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
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
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(BookRepository::new(ctx.db.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
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
        let book = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Book" }
                    }
                }
            })
        };
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All books ordered by id",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": book("Created book"),
                            "400": error("Missing title or author")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": book("The book"),
                            "404": error("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Update a book; absent fields are kept",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": book("Updated book"),
                            "400": error("Empty or overlong field"),
                            "404": error("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": {
                                "description": "Book deleted",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "message": { "type": "string" } },
                                            "required": ["message"]
                                        }
                                    }
                                }
                            },
                            "404": error("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "integer",
                                "format": "int64",
                                "description": "Server-assigned identifier"
                            },
                            "title": {
                                "type": "string",
                                "maxLength": models::MAX_FIELD_CHARS,
                                "description": "Title of the book"
                            },
                            "author": {
                                "type": "string",
                                "maxLength": models::MAX_FIELD_CHARS,
                                "description": "Author of the book"
                            }
                        },
                        "required": ["id", "title", "author"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1, "maxLength": models::MAX_FIELD_CHARS },
                            "author": { "type": "string", "minLength": 1, "maxLength": models::MAX_FIELD_CHARS }
                        },
                        "required": ["title", "author"]
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1, "maxLength": models::MAX_FIELD_CHARS },
                            "author": { "type": "string", "minLength": 1, "maxLength": models::MAX_FIELD_CHARS }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS book (
                    id     INTEGER PRIMARY KEY AUTOINCREMENT,
                    title  VARCHAR(120) NOT NULL CHECK (title <> ''),
                    author VARCHAR(120) NOT NULL CHECK (author <> '')
                );
                "#,
        }]
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

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
