pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Module};

use routes::SharedStore;

/// Books module: CRUD over the `books` table.
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
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
            legacy_columns = ctx.settings.database.legacy_columns,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
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

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: &serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });
    let book_body = json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/NewBook" }
            }
        }
    });
    let book = json!({ "$ref": "#/components/schemas/Book" });
    let outcome = json!({ "$ref": "#/components/schemas/MutationResponse" });

    json!({
        "paths": {
            "/book": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("All books", &json!({ "type": "array", "items": book })),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/book/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": json_response("The book", &book),
                        "400": error_response("Invalid id"),
                        "404": error_response("No book with this id"),
                        "500": error_response("Internal server error")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "requestBody": book_body,
                    "responses": {
                        "200": json_response("Rows affected", &outcome),
                        "400": error_response("Invalid id or body"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/newbook": {
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body,
                    "responses": {
                        "200": json_response("Generated id", &outcome),
                        "400": error_response("Invalid body"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/deletebook/{id}": {
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": json_response("Rows affected", &outcome),
                        "400": error_response("Invalid id"),
                        "500": error_response("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "bookID": {
                            "type": "integer",
                            "format": "int64",
                            "description": "Database-generated identifier"
                        },
                        "name": { "type": "string", "description": "Title of the book" },
                        "author": { "type": "string", "description": "Author of the book" },
                        "publisher": { "type": "string", "description": "Publisher of the book" }
                    }
                },
                "NewBook": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "author": { "type": "string" },
                        "publisher": { "type": "string" }
                    }
                },
                "MutationResponse": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "message": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
