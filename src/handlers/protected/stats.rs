// handlers/protected/stats.rs - catalog statistics

use axum::extract::State;
use serde::Serialize;

use crate::database::models::PriceStats;
use crate::middleware::{ApiResult, WebResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TotalBooks {
    pub total_books: i64,
}

/// GET /api/books/stats/total
pub async fn total(State(state): State<AppState>) -> ApiResult<TotalBooks> {
    let total_books = state.books.total().await?;
    Ok(WebResponse::success(TotalBooks { total_books }))
}

/// GET /api/books/stats/price - min/max/avg over all books; nulls when empty
pub async fn price(State(state): State<AppState>) -> ApiResult<PriceStats> {
    Ok(WebResponse::success(state.books.price_stats().await?))
}
