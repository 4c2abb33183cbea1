//! HTTP handlers for the books module, mounted under `/api/books`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use libadmin_http::error::AppError;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};

use super::ledger::{Ledger, LedgerError};
use super::models::{AddBook, Book, BorrowBook, BorrowReceipt, ReturnBook, ReturnReceipt};
use super::notices::{ActiveNotices, Channel, Notice, NoticeBoard};

/// Shared state behind every books handler. Each request runs a single
/// ledger operation to completion under the write lock.
pub struct BooksState {
    pub ledger: RwLock<Ledger>,
    pub notices: Mutex<NoticeBoard>,
}

impl BooksState {
    pub fn new(ledger: Ledger, notice_ttl: Duration) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            notices: Mutex::new(NoticeBoard::new(notice_ttl)),
        }
    }

    async fn post_notice(&self, channel: Channel, notice: Notice) {
        self.notices.lock().await.post(channel, notice, Instant::now());
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match &err {
            LedgerError::NotFound { .. } => AppError::not_found(message),
            LedgerError::OutOfStock { isbn }
            | LedgerError::Inactive { isbn }
            | LedgerError::NoActiveLoan { isbn }
            | LedgerError::DuplicateIsbn { isbn } => {
                AppError::conflict(vec![json!({ "isbn": isbn })], message).with_code(err.code())
            }
            LedgerError::EmptyField { field } => AppError::validation(
                vec![json!({ "field": field, "error": "required" })],
                message,
            ),
            LedgerError::InvalidQuantity => AppError::validation(
                vec![json!({ "field": "quantity", "error": "minimum 1" })],
                message,
            ),
        }
    }
}

pub fn router(state: Arc<BooksState>) -> Router {
    Router::new()
        .route("/", get(list_books).post(add_book))
        .route("/borrow", post(borrow_book))
        .route("/return", post(return_book))
        .route("/notices", get(active_notices))
        .route("/health", get(health_check))
        .route("/{isbn}", get(get_book))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    q: Option<String>,
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

/// Whole catalogue, or the titles matching `?q=`
async fn list_books(
    State(state): State<Arc<BooksState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Book>> {
    let ledger = state.ledger.read().await;
    let books = match query.q.as_deref() {
        Some(q) => ledger.search(q).into_iter().cloned().collect(),
        None => ledger.list().to_vec(),
    };
    Json(books)
}

async fn get_book(
    State(state): State<Arc<BooksState>>,
    Path(isbn): Path<String>,
) -> Result<Json<Book>, AppError> {
    let ledger = state.ledger.read().await;
    ledger
        .get(&isbn)
        .cloned()
        .map(Json)
        .ok_or_else(|| LedgerError::NotFound { isbn }.into())
}

async fn borrow_book(
    State(state): State<Arc<BooksState>>,
    payload: Result<Json<BorrowBook>, JsonRejection>,
) -> Result<Json<BorrowReceipt>, AppError> {
    let Json(request) = payload?;
    let reader_id = request.reader_id.clone();

    let outcome = state
        .ledger
        .write()
        .await
        .borrow(request, OffsetDateTime::now_utc());

    match outcome {
        Ok(receipt) => {
            state
                .post_notice(Channel::Borrow, Notice::borrowed(&receipt, &reader_id))
                .await;
            Ok(Json(receipt))
        }
        Err(err) => {
            state.post_notice(Channel::Borrow, Notice::error(&err)).await;
            Err(err.into())
        }
    }
}

async fn return_book(
    State(state): State<Arc<BooksState>>,
    payload: Result<Json<ReturnBook>, JsonRejection>,
) -> Result<Json<ReturnReceipt>, AppError> {
    let Json(request) = payload?;

    let outcome = state
        .ledger
        .write()
        .await
        .return_book(request, OffsetDateTime::now_utc());

    match outcome {
        Ok(receipt) => {
            state
                .post_notice(Channel::Return, Notice::returned(&receipt))
                .await;
            Ok(Json(receipt))
        }
        Err(err) => {
            state.post_notice(Channel::Return, Notice::error(&err)).await;
            Err(err.into())
        }
    }
}

async fn add_book(
    State(state): State<Arc<BooksState>>,
    payload: Result<Json<AddBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(request) = payload?;

    let outcome = state.ledger.write().await.add_book(request);

    match outcome {
        Ok(book) => {
            state
                .post_notice(
                    Channel::AddBook,
                    Notice::success(format!(
                        "Added \"{}\" with {} cop{}",
                        book.title,
                        book.total_count,
                        if book.total_count == 1 { "y" } else { "ies" }
                    )),
                )
                .await;
            Ok((StatusCode::CREATED, Json(book)))
        }
        Err(err) => {
            state
                .post_notice(Channel::AddBook, Notice::error(&err))
                .await;
            Err(err.into())
        }
    }
}

/// Status line of each form; expired notices read as null
async fn active_notices(State(state): State<Arc<BooksState>>) -> Json<ActiveNotices> {
    let now = Instant::now();
    let mut board = state.notices.lock().await;
    board.prune(now);
    Json(board.active(now))
}
