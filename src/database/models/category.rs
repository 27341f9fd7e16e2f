use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::database::repository::Entity;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Category {
    const TABLE: &'static str = "categories";
    const SELECT: &'static str = "SELECT id, name, created_at, updated_at FROM categories";
    const KEY: &'static str = "id";
    const ORDER_BY: &'static str = "id";
}
