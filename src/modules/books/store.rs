//! Data access for the `books` table.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::models::{Book, NewBook};

/// Failures surfaced by a [`BookStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection unavailable")]
    Connection(#[source] sqlx::Error),

    #[error("query failed")]
    Query(#[source] sqlx::Error),

    #[error("failed to decode row")]
    Decode(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_) => StoreError::Connection(err),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_) => StoreError::Decode(err),
            _ => StoreError::Query(err),
        }
    }
}

impl From<StoreError> for shelf_http::error::AppError {
    fn from(err: StoreError) -> Self {
        shelf_http::error::AppError::Internal(anyhow::Error::new(err))
    }
}

/// The five book operations, one statement each.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a book and return the generated id.
    async fn create(&self, book: &NewBook) -> Result<i64, StoreError>;

    /// Fetch a single book; `None` when no row matches.
    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError>;

    /// Fetch every book, in whatever order the database returns them.
    async fn get_all(&self) -> Result<Vec<Book>, StoreError>;

    /// Overwrite name, author and publisher; returns rows affected.
    async fn update(&self, id: i64, book: &NewBook) -> Result<u64, StoreError>;

    /// Remove a book; returns rows affected.
    async fn delete(&self, id: i64) -> Result<u64, StoreError>;
}

/// Physical column names for author and publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// `author`, `publisher`
    Standard,
    /// `price`, `company`, as found in older deployments
    Legacy,
}

impl ColumnLayout {
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            ColumnLayout::Legacy
        } else {
            ColumnLayout::Standard
        }
    }

    fn columns(self) -> (&'static str, &'static str) {
        match self {
            ColumnLayout::Standard => ("author", "publisher"),
            ColumnLayout::Legacy => ("price", "company"),
        }
    }
}

/// SQL text for each operation, rendered once for a column layout.
#[derive(Debug, Clone)]
struct Statements {
    insert: String,
    select_one: String,
    select_all: String,
    update: String,
    delete: String,
}

impl Statements {
    fn new(layout: ColumnLayout) -> Self {
        let (author, publisher) = layout.columns();
        let select = format!(
            "SELECT bookid::BIGINT AS bookid, name, {author} AS author, {publisher} AS publisher FROM books"
        );

        Self {
            insert: format!(
                "INSERT INTO books (name, {author}, {publisher}) VALUES ($1, $2, $3) RETURNING bookid::BIGINT"
            ),
            select_one: format!("{select} WHERE bookid = $1"),
            select_all: select,
            update: format!(
                "UPDATE books SET name = $2, {author} = $3, {publisher} = $4 WHERE bookid = $1"
            ),
            delete: "DELETE FROM books WHERE bookid = $1".to_string(),
        }
    }
}

/// [`BookStore`] backed by a shared PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
    statements: Statements,
}

impl PgBookStore {
    pub fn new(pool: PgPool, layout: ColumnLayout) -> Self {
        Self {
            pool,
            statements: Statements::new(layout),
        }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn create(&self, book: &NewBook) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(&self.statements.insert)
            .bind(&book.name)
            .bind(&book.author)
            .bind(&book.publisher)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(book_id = id, "inserted book");
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let book = sqlx::query_as::<_, Book>(&self.statements.select_one)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if book.is_none() {
            tracing::debug!(book_id = id, "no book with this id");
        }
        Ok(book)
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        let books = sqlx::query_as::<_, Book>(&self.statements.select_all)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn update(&self, id: i64, book: &NewBook) -> Result<u64, StoreError> {
        let result = sqlx::query(&self.statements.update)
            .bind(id)
            .bind(&book.name)
            .bind(&book.author)
            .bind(&book.publisher)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(&self.statements.delete)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
