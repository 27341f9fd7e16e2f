// handlers/protected/categories.rs - /api/categories CRUD

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::database::models::Category;
use crate::middleware::{ApiResult, WebResponse};
use crate::state::AppState;
use crate::types::{PageQuery, Pagination};

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
}

/// POST /api/categories - Create a category
///
/// Names are trimmed and must be unique; a duplicate answers 409 with
/// `errors.name` set.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<Category> {
    let Json(request) = payload?;
    let category = state.categories.create(&request.name).await?;
    Ok(WebResponse::created(category))
}

/// GET /api/categories?page=&size=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Vec<Category>> {
    let page = state.categories.list(Pagination::from(query)).await?;
    Ok(WebResponse::from(page))
}

/// PUT /api/categories/:id - Rename a category
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<Category> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let category = state.categories.update(id, &request.name).await?;
    Ok(WebResponse::success(category))
}

/// DELETE /api/categories/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = path?;
    state.categories.delete(id).await?;
    Ok(WebResponse::message_only("category deleted"))
}
