use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::database::repository::Entity;

/// A catalog row joined with the name of its category.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub year: Option<i32>,
    pub category_id: i64,
    pub category_name: String,
    pub image_base64: String,
}

impl Entity for Book {
    const TABLE: &'static str = "books";
    const SELECT: &'static str = "SELECT b.id, b.title, b.author, b.price, b.year, b.category_id, \
         c.name AS category_name, b.image_base64 \
         FROM books b JOIN categories c ON c.id = b.category_id";
    const KEY: &'static str = "b.id";
    const ORDER_BY: &'static str = "b.id";
}

/// Column values for an insert or a full-row update.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub year: Option<i32>,
    pub category_id: i64,
    pub image_base64: String,
}

impl From<Book> for NewBook {
    fn from(book: Book) -> Self {
        Self {
            title: book.title,
            author: book.author,
            price: book.price,
            year: book.year,
            category_id: book.category_id,
            image_base64: book.image_base64,
        }
    }
}

/// Aggregates over the whole catalog, computed in one query.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PriceStats {
    pub total_books: i64,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub min_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub max_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub avg_price: Option<Decimal>,
}
