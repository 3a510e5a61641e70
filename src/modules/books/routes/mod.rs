//! HTTP handlers for the books module.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use shelf_http::error::AppError;

use super::models::{Book, MutationResponse, NewBook};
use super::store::BookStore;
use crate::utils;

pub type SharedStore = Arc<dyn BookStore>;

/// Build the books router; paths are relative to the `/api` prefix.
pub fn router(store: SharedStore) -> Router {
    let prefix = utils::log_prefix("books");
    tracing::info!(target: "shelf.routes", %prefix, "registering books routes");

    Router::new()
        .route(
            "/book/{id}",
            get(get_book)
                .put(update_book)
                .options(|| allow_options("GET, PUT, OPTIONS")),
        )
        .route(
            "/book",
            get(get_all_books).options(|| allow_options("GET, OPTIONS")),
        )
        .route(
            "/newbook",
            post(create_book).options(|| allow_options("POST, OPTIONS")),
        )
        .route(
            "/deletebook/{id}",
            delete(delete_book).options(|| allow_options("DELETE, OPTIONS")),
        )
        .with_state(store)
}

/// Plain `OPTIONS` answer; CORS preflights are handled by the middleware.
async fn allow_options(methods: &'static str) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(header::ALLOW, methods)])
}

/// Decode a book body regardless of the declared content type.
fn decode_book(body: &Bytes) -> Result<NewBook, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::invalid_body(e.to_string()))
}

pub fn update_message(rows: u64) -> String {
    if rows == 1 {
        "Book Updated successfully".to_string()
    } else {
        format!("Book updated. Total rows/record affected {}", rows)
    }
}

pub fn delete_message(rows: u64) -> String {
    if rows == 1 {
        "Book Deleted successfully".to_string()
    } else {
        format!("Book Deleted. Total rows/record affected {}", rows)
    }
}

async fn create_book(
    State(store): State<SharedStore>,
    body: Bytes,
) -> Result<Json<MutationResponse>, AppError> {
    let book = decode_book(&body)?;
    let id = store.create(&book).await?;

    tracing::info!(book_id = id, "book created");
    Ok(Json(MutationResponse::new(id, "Book created successfully")))
}

async fn get_book(
    State(store): State<SharedStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;

    match store.get(id).await? {
        Some(book) => Ok(Json(book)),
        None => Err(AppError::not_found(format!("book {} does not exist", id))),
    }
}

async fn get_all_books(State(store): State<SharedStore>) -> Result<Json<Vec<Book>>, AppError> {
    let books = store.get_all().await?;
    Ok(Json(books))
}

async fn update_book(
    State(store): State<SharedStore>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<MutationResponse>, AppError> {
    let Path(id) = id?;
    let book = decode_book(&body)?;
    let rows = store.update(id, &book).await?;

    tracing::info!(book_id = id, rows, "book update applied");
    Ok(Json(MutationResponse::new(id, update_message(rows))))
}

async fn delete_book(
    State(store): State<SharedStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MutationResponse>, AppError> {
    let Path(id) = id?;
    let rows = store.delete(id).await?;

    tracing::info!(book_id = id, rows, "book delete applied");
    Ok(Json(MutationResponse::new(id, delete_message(rows))))
}
