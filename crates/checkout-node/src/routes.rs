//! HTTP handlers for reading the chain, recording checkouts, and
//! registering books.

use axum::{extract::State, Json};
use checkout_core::{CheckoutRecord, HashBlock};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;

/// GET / — the full ordered block sequence.
pub async fn read_chain(State(state): State<AppState>) -> Json<Vec<HashBlock>> {
    let guard = state.chain.read().expect("chain lock poisoned");
    Json(guard.blocks().to_vec())
}

/// POST / — record a checkout.
///
/// Answers 200 with the echoed payload whether or not the block was
/// accepted; existing clients depend on that shape, so the rejection
/// reason only reaches the log.
pub async fn write_checkout(
    State(state): State<AppState>,
    Json(record): Json<CheckoutRecord>,
) -> Json<CheckoutRecord> {
    let mut guard = state.chain.write().expect("chain lock poisoned");
    match guard.append(record.clone()) {
        Ok(block) => info!(position = block.position, hash = %block.hash, "checkout appended"),
        Err(reason) => warn!(%reason, "checkout rejected"),
    }
    drop(guard);
    Json(record)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub author: String,
    pub published_date: String,
    pub isbn: String,
}

/// POST /new — register a book, deriving its content-addressed id.
pub async fn register_book(Json(mut book): Json<Book>) -> Json<Book> {
    book.id = book_id(&book.isbn, &book.published_date);
    info!(id = %book.id, title = %book.title, "book registered");
    Json(book)
}

/// Book identifier: md5 over ISBN and publication date, lowercase hex.
/// Identical inputs always yield the identical id.
fn book_id(isbn: &str, published_date: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(isbn.as_bytes());
    hasher.update(published_date.as_bytes());
    hex::encode(hasher.finalize())
}

/// GET /health
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
