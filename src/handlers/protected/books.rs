// handlers/protected/books.rs - /api/books CRUD (multipart forms)

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::rejection::PathRejection,
    extract::{Multipart, Path, Query, State},
};
use rust_decimal::Decimal;

use crate::database::models::Book;
use crate::error::ApiError;
use crate::middleware::{ApiResult, WebResponse};
use crate::services::{BookInput, BookPatch};
use crate::state::AppState;
use crate::types::{PageQuery, Pagination};

/// Fields of a book form as they arrived. Text parts are kept raw until
/// [`BookForm::into_input`] or [`BookForm::into_patch`] parses them.
#[derive(Debug, Default)]
pub struct BookForm {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<String>,
    pub year: Option<String>,
    pub category_id: Option<String>,
    pub image: Option<Vec<u8>>,
}

impl BookForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = BookForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => form.image = Some(field.bytes().await?.to_vec()),
                "title" => form.title = Some(field.text().await?),
                "author" => form.author = Some(field.text().await?),
                "price" => form.price = Some(field.text().await?),
                "year" => form.year = Some(field.text().await?),
                "category_id" => form.category_id = Some(field.text().await?),
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }

    /// Every text field is required except `year`.
    pub fn into_input(self) -> Result<(BookInput, Option<Vec<u8>>), ApiError> {
        let mut errors = HashMap::new();
        let title = required(&mut errors, "title", self.title);
        let author = required(&mut errors, "author", self.author);
        let price = required(&mut errors, "price", self.price)
            .and_then(|raw| parse(&mut errors, "price", &raw, "price must be a number"));
        let category_id = required(&mut errors, "category_id", self.category_id).and_then(|raw| {
            parse(&mut errors, "category_id", &raw, "category_id must be an integer")
        });
        let year = optional(self.year)
            .and_then(|raw| parse(&mut errors, "year", &raw, "year must be an integer"));

        match (title, author, price, category_id) {
            (Some(title), Some(author), Some(price), Some(category_id)) if errors.is_empty() => Ok((
                BookInput {
                    title,
                    author,
                    price,
                    year,
                    category_id,
                },
                self.image,
            )),
            _ => Err(ApiError::validation_error(
                "validation failed, please check your input",
                Some(errors),
            )),
        }
    }

    /// Absent or blank fields leave the stored value alone.
    pub fn into_patch(self) -> Result<(BookPatch, Option<Vec<u8>>), ApiError> {
        let mut errors = HashMap::new();
        let patch = BookPatch {
            title: optional(self.title),
            author: optional(self.author),
            price: optional(self.price)
                .and_then(|raw| parse(&mut errors, "price", &raw, "price must be a number")),
            year: optional(self.year)
                .and_then(|raw| parse(&mut errors, "year", &raw, "year must be an integer")),
            category_id: optional(self.category_id).and_then(|raw| {
                parse(&mut errors, "category_id", &raw, "category_id must be an integer")
            }),
        };
        if errors.is_empty() {
            Ok((patch, self.image))
        } else {
            Err(ApiError::validation_error(
                "validation failed, please check your input",
                Some(errors),
            ))
        }
    }
}

fn optional(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn required(
    errors: &mut HashMap<String, String>,
    field: &str,
    raw: Option<String>,
) -> Option<String> {
    let value = optional(raw);
    if value.is_none() {
        errors.insert(field.to_string(), format!("{field} is required"));
    }
    value
}

fn parse<T: FromStr>(
    errors: &mut HashMap<String, String>,
    field: &str,
    raw: &str,
    problem: &str,
) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.insert(field.to_string(), problem.to_string());
            None
        }
    }
}

/// POST /api/books - Create a book from a multipart form
///
/// Form fields: `title`, `author`, `price`, `year` (optional), `category_id`
/// and the file part `image`. The image is stored as base64 text and may
/// not exceed 5 MiB.
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Book> {
    let (input, image) = BookForm::read(multipart).await?.into_input()?;
    let book = state.books.create(input, image).await?;
    Ok(WebResponse::created(book))
}

/// GET /api/books?page=&size=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Vec<Book>> {
    let page = state.books.list(Pagination::from(query)).await?;
    Ok(WebResponse::from(page))
}

/// GET /api/books/:id
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Book> {
    let Path(id) = path?;
    Ok(WebResponse::success(state.books.get(id).await?))
}

/// PUT /api/books/:id - Partial update from a multipart form
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    multipart: Multipart,
) -> ApiResult<Book> {
    let Path(id) = path?;
    let (patch, image) = BookForm::read(multipart).await?.into_patch()?;
    let book = state.books.update(id, patch, image).await?;
    Ok(WebResponse::success(book))
}

/// DELETE /api/books/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = path?;
    state.books.delete(id).await?;
    Ok(WebResponse::message_only("book deleted"))
}
