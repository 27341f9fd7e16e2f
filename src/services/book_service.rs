// services/book_service.rs - book catalog, images and price statistics
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Datelike;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use crate::database::models::{Book, NewBook, PriceStats};
use crate::database::DatabaseError;
use crate::repositories::{BookRepository, CategoryRepository};
use crate::services::error::{translate_validation_errors, ServiceError};
use crate::types::{Page, Pagination};

/// Largest accepted cover image, before base64 encoding.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// `books.price` is `NUMERIC(10, 2)`.
const MAX_PRICE_EXCLUSIVE: i64 = 100_000_000;

/// Complete set of editable book fields.
#[derive(Debug, Clone, Validate)]
pub struct BookInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub author: String,
    pub price: Decimal,
    pub year: Option<i32>,
    pub category_id: i64,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<Decimal>,
    pub year: Option<i32>,
    pub category_id: Option<i64>,
}

#[derive(Clone)]
pub struct BookService {
    pool: PgPool,
    books: BookRepository,
    categories: CategoryRepository,
}

impl BookService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            books: BookRepository::new(),
            categories: CategoryRepository::new(),
        }
    }

    pub async fn create(&self, input: BookInput, image: Option<Vec<u8>>) -> Result<Book, ServiceError> {
        let input = trimmed(input);
        check_book(&input)?;
        let image = match image {
            Some(bytes) if !bytes.is_empty() => encode_image(&bytes)?,
            _ => return Err(ServiceError::invalid_field("image", "image is required")),
        };

        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.ensure_category(&mut conn, input.category_id).await?;
        self.ensure_title_free(&mut conn, &input.title, None).await?;

        let book = self
            .books
            .insert(&mut conn, &to_row(input, image))
            .await?;
        tracing::info!(book_id = book.id, title = %book.title, "book created");
        Ok(book)
    }

    pub async fn list(&self, pagination: Pagination) -> Result<Page<Book>, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let items = self
            .books
            .page(&mut conn, pagination.offset(), pagination.size)
            .await?;
        let total = self.books.count(&mut conn).await?;
        Ok(Page::new(items, pagination, total))
    }

    pub async fn get(&self, id: i64) -> Result<Book, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.books
            .find_by_id(&mut conn, id)
            .await
            .map_err(|e| book_not_found(e, id))
    }

    pub async fn update(
        &self,
        id: i64,
        patch: BookPatch,
        image: Option<Vec<u8>>,
    ) -> Result<Book, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let current = self
            .books
            .find_by_id(&mut conn, id)
            .await
            .map_err(|e| book_not_found(e, id))?;

        let mut row = NewBook::from(current);
        let input = trimmed(apply_patch(&row, patch));
        check_book(&input)?;
        if let Some(bytes) = image.filter(|b| !b.is_empty()) {
            row.image_base64 = encode_image(&bytes)?;
        }

        self.ensure_category(&mut conn, input.category_id).await?;
        self.ensure_title_free(&mut conn, &input.title, Some(id)).await?;

        let row = to_row(input, row.image_base64);
        let book = self
            .books
            .update(&mut conn, id, &row)
            .await
            .map_err(|e| book_not_found(e, id))?;
        tracing::info!(book_id = id, "book updated");
        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        match self.books.delete(&mut conn, id).await {
            Ok(()) => {
                tracing::info!(book_id = id, "book deleted");
                Ok(())
            }
            Err(e) if e.is_foreign_key_violation() => Err(ServiceError::conflict(
                "book_id",
                "book is referenced by orders and cannot be deleted",
            )),
            Err(e) => Err(book_not_found(e, id)),
        }
    }

    pub async fn total(&self) -> Result<i64, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        Ok(self.books.count(&mut conn).await?)
    }

    pub async fn price_stats(&self) -> Result<PriceStats, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        Ok(self.books.price_stats(&mut conn).await?)
    }

    async fn ensure_category(&self, conn: &mut PgConnection, category_id: i64) -> Result<(), ServiceError> {
        match self.categories.find_by_id(conn, category_id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Err(ServiceError::invalid_field(
                "category_id",
                format!("category not found: {category_id}"),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Titles are the only unique book attribute.
    async fn ensure_title_free(
        &self,
        conn: &mut PgConnection,
        title: &str,
        own_id: Option<i64>,
    ) -> Result<(), ServiceError> {
        match self.books.find_by_title(conn, title).await? {
            Some(existing) if Some(existing.id) != own_id => {
                Err(ServiceError::conflict("title", "book title already exists"))
            }
            _ => Ok(()),
        }
    }
}

fn book_not_found(e: DatabaseError, id: i64) -> ServiceError {
    if e.is_not_found() {
        ServiceError::not_found(format!("book not found: {id}"))
    } else {
        e.into()
    }
}

fn trimmed(mut input: BookInput) -> BookInput {
    input.title = input.title.trim().to_string();
    input.author = input.author.trim().to_string();
    input
}

fn apply_patch(current: &NewBook, patch: BookPatch) -> BookInput {
    BookInput {
        title: patch.title.unwrap_or_else(|| current.title.clone()),
        author: patch.author.unwrap_or_else(|| current.author.clone()),
        price: patch.price.unwrap_or(current.price),
        year: patch.year.or(current.year),
        category_id: patch.category_id.unwrap_or(current.category_id),
    }
}

fn to_row(input: BookInput, image_base64: String) -> NewBook {
    NewBook {
        title: input.title,
        author: input.author,
        price: input.price,
        year: input.year,
        category_id: input.category_id,
        image_base64,
    }
}

/// Field-level checks that do not need the database.
pub fn check_book(input: &BookInput) -> Result<(), ServiceError> {
    let mut field_errors = match input.validate() {
        Ok(()) => Default::default(),
        Err(errors) => translate_validation_errors(&errors),
    };

    if input.price <= Decimal::ZERO {
        field_errors.insert("price".to_string(), "price must be greater than 0".to_string());
    } else if input.price >= Decimal::from(MAX_PRICE_EXCLUSIVE) {
        field_errors.insert(
            "price".to_string(),
            format!("price must be less than {MAX_PRICE_EXCLUSIVE}"),
        );
    } else if input.price.normalize().scale() > 2 {
        field_errors.insert(
            "price".to_string(),
            "price must have at most 2 decimal places".to_string(),
        );
    }
    if let Some(year) = input.year {
        let latest = chrono::Utc::now().year() + 1;
        if year <= 0 || year > latest {
            field_errors.insert(
                "year".to_string(),
                format!("year must be between 1 and {latest}"),
            );
        }
    }
    if input.category_id <= 0 {
        field_errors.insert("category_id".to_string(), "category_id is required".to_string());
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation(
            "validation failed, please check your input",
            field_errors,
        ))
    }
}

pub fn encode_image(bytes: &[u8]) -> Result<String, ServiceError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ServiceError::invalid_field(
            "image",
            "image must be at most 5 MiB",
        ));
    }
    Ok(STANDARD.encode(bytes))
}
