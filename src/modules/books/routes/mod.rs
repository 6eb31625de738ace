use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::AppError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::models::{Book, CreateBook, UpdateBook};
use super::repository::BookRepository;

const NOT_FOUND: &str = "Book not found";

type JsonObject = Map<String, Value>;

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

/// Routes for the books module, relative to its mount point.
pub fn router(repository: BookRepository) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(repository)
}

fn not_found() -> AppError {
    AppError::not_found(NOT_FOUND)
}

/// Request bodies must be JSON objects; derived struct deserializers would
/// otherwise also read an array positionally.
fn decode<T: DeserializeOwned>(
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(object) = payload?;
    serde_json::from_value(Value::Object(object)).map_err(|err| AppError::bad_request(err.to_string()))
}

/// Only integer ids name a book; anything else is simply not found.
fn book_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| not_found())
}

async fn list_books(State(repository): State<BookRepository>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(repository.list().await?))
}

async fn get_book(
    State(repository): State<BookRepository>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(path)?;
    repository.get(id).await?.map(Json).ok_or_else(not_found)
}

async fn create_book(
    State(repository): State<BookRepository>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let new_book = decode::<CreateBook>(payload)?.validate()?;

    let book = repository.create(&new_book).await?;
    tracing::info!(book_id = book.id, "book created");

    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(repository): State<BookRepository>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(path)?;
    // An unknown id is not found whatever the body holds
    if repository.get(id).await?.is_none() {
        return Err(not_found());
    }
    let changes = decode::<UpdateBook>(payload)?.validate()?;

    let book = repository.update(id, &changes).await?.ok_or_else(not_found)?;
    tracing::info!(book_id = book.id, "book updated");

    Ok(Json(book))
}

async fn delete_book(
    State(repository): State<BookRepository>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Deleted>, AppError> {
    let id = book_id(path)?;
    if !repository.delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(book_id = id, "book deleted");

    Ok(Json(Deleted {
        message: "Book deleted",
    }))
}
