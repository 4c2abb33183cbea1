pub mod ledger;
pub mod models;
pub mod notices;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use libadmin_kernel::{settings::LedgerSettings, InitCtx, Module};
use serde_json::json;

use ledger::{Ledger, LendingPolicy};
use routes::BooksState;

/// Books module: the inventory ledger and its console endpoints
pub struct BooksModule {
    state: Arc<BooksState>,
}

impl BooksModule {
    pub fn new(settings: &LedgerSettings) -> anyhow::Result<Self> {
        let policy = LendingPolicy::from_settings(settings);
        let ledger = if settings.seed_demo_data {
            Ledger::with_books(policy, ledger::demo_books())?
        } else {
            Ledger::new(policy)
        };

        Ok(Self {
            state: Arc::new(BooksState::new(
                ledger,
                Duration::from_millis(settings.notice_ttl_ms),
            )),
        })
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
            loan_period_days = ctx.settings.ledger.loan_period_days,
            daily_fine = ctx.settings.ledger.daily_fine,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let titles = self.state.ledger.read().await.len();
        tracing::info!(module = self.name(), titles, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(settings: &LedgerSettings) -> anyhow::Result<Arc<dyn Module>> {
    Ok(Arc::new(BooksModule::new(settings)?))
}

fn json_body(schema: &str) -> serde_json::Value {
    json!({
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn error_response(description: &str) -> serde_json::Value {
    let mut response = json_body("ErrorResponse");
    response["description"] = json!(description);
    response
}

fn ok_response(description: &str, schema: &str) -> serde_json::Value {
    let mut response = json_body(schema);
    response["description"] = json!(description);
    response
}

fn openapi_fragment() -> serde_json::Value {
    let isbn_param = json!({
        "name": "isbn",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List or search books",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "q",
                        "in": "query",
                        "required": false,
                        "description": "Case-insensitive match on title, ISBN or author",
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": {
                            "description": "Books in catalogue order",
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
                    "summary": "Add a book",
                    "tags": ["Books"],
                    "requestBody": json_body("AddBook"),
                    "responses": {
                        "201": ok_response("Book added", "Book"),
                        "409": error_response("ISBN already catalogued"),
                        "422": error_response("Missing title or ISBN, or quantity below 1")
                    }
                }
            },
            "/{isbn}": {
                "get": {
                    "summary": "Look up a book by ISBN",
                    "tags": ["Books"],
                    "parameters": [isbn_param],
                    "responses": {
                        "200": ok_response("Book", "Book"),
                        "404": error_response("No book with this ISBN")
                    }
                }
            },
            "/borrow": {
                "post": {
                    "summary": "Borrow a copy",
                    "tags": ["Books"],
                    "requestBody": json_body("BorrowBook"),
                    "responses": {
                        "200": ok_response("Copy lent", "BorrowReceipt"),
                        "404": error_response("No book with this ISBN"),
                        "409": error_response("Out of stock or not shelved"),
                        "422": error_response("Missing reader id or ISBN")
                    }
                }
            },
            "/return": {
                "post": {
                    "summary": "Return a copy",
                    "tags": ["Books"],
                    "requestBody": json_body("ReturnBook"),
                    "responses": {
                        "200": ok_response("Copy returned, with overdue fee if late", "ReturnReceipt"),
                        "404": error_response("No book with this ISBN"),
                        "409": error_response("No copy on loan")
                    }
                }
            },
            "/notices": {
                "get": {
                    "summary": "Current status notice of each form",
                    "tags": ["Books"],
                    "responses": {
                        "200": ok_response("Active notices", "ActiveNotices")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "title": { "type": "string" },
                        "isbn": { "type": "string" },
                        "author": { "type": "string" },
                        "category": { "$ref": "#/components/schemas/Category" },
                        "status": {
                            "type": "string",
                            "enum": ["available", "borrowed", "inactive"]
                        },
                        "availableCount": { "type": "integer", "minimum": 0 },
                        "totalCount": { "type": "integer", "minimum": 1 },
                        "borrowedBy": { "type": "string" },
                        "dueDate": { "type": "string", "format": "date" }
                    },
                    "required": ["id", "title", "isbn", "category", "status", "availableCount", "totalCount"]
                },
                "Category": {
                    "type": "string",
                    "enum": ["literature", "science", "technology", "history", "art", "philosophy", "business", "education"]
                },
                "AddBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "isbn": { "type": "string" },
                        "author": { "type": "string" },
                        "category": { "$ref": "#/components/schemas/Category" },
                        "quantity": { "type": "integer", "minimum": 1 },
                        "isActive": { "type": "boolean", "default": true }
                    },
                    "required": ["title", "isbn", "category", "quantity"]
                },
                "BorrowBook": {
                    "type": "object",
                    "properties": {
                        "readerId": { "type": "string" },
                        "isbn": { "type": "string" },
                        "dueDate": { "type": "string", "format": "date" }
                    },
                    "required": ["readerId", "isbn"]
                },
                "ReturnBook": {
                    "type": "object",
                    "properties": {
                        "isbn": { "type": "string" },
                        "readerId": { "type": "string" }
                    },
                    "required": ["isbn"]
                },
                "BorrowReceipt": {
                    "type": "object",
                    "properties": {
                        "book": { "$ref": "#/components/schemas/Book" },
                        "dueDate": { "type": "string", "format": "date" }
                    },
                    "required": ["book", "dueDate"]
                },
                "ReturnReceipt": {
                    "type": "object",
                    "properties": {
                        "book": { "$ref": "#/components/schemas/Book" },
                        "overdue": {
                            "type": "object",
                            "properties": {
                                "days": { "type": "integer" },
                                "fee": { "type": "integer" }
                            },
                            "required": ["days", "fee"]
                        }
                    },
                    "required": ["book"]
                },
                "Notice": {
                    "type": "object",
                    "properties": {
                        "kind": { "type": "string", "enum": ["success", "warning", "error"] },
                        "message": { "type": "string" },
                        "overdueDays": { "type": "integer" },
                        "fee": { "type": "integer" }
                    },
                    "required": ["kind", "message"]
                },
                "ActiveNotices": {
                    "type": "object",
                    "properties": {
                        "borrow": { "$ref": "#/components/schemas/Notice" },
                        "return": { "$ref": "#/components/schemas/Notice" },
                        "addBook": { "$ref": "#/components/schemas/Notice" }
                    }
                }
            }
        }
    })
}
