// handlers/protected/orders.rs - POST /api/orders, POST /api/orders/:id/pay, GET /api/orders

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::OrderWithLines;
use crate::middleware::{ApiResult, AuthUser, WebResponse};
use crate::services::OrderItemInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

/// POST /api/orders - Place an order for the authenticated user
///
/// Expected Input:
/// ```json
/// { "items": [ { "book_id": 1, "quantity": 2 } ] }
/// ```
///
/// Each line takes 1 to 5 copies and the whole order at most 5. Prices are
/// captured now; later price changes do not touch this order.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<OrderWithLines> {
    let Json(request) = payload?;
    let order = state.orders.create_order(user.user_id, &request.items).await?;
    Ok(WebResponse::created(order))
}

/// POST /api/orders/:id/pay
pub async fn pay(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<OrderWithLines> {
    let Path(id) = path?;
    let order = state.orders.pay_order(id, user.user_id).await?;
    Ok(WebResponse::success(order).with_message("order paid"))
}

/// GET /api/orders - The caller's orders, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<OrderWithLines>> {
    let orders = state.orders.list_orders_by_user(user.user_id).await?;
    Ok(WebResponse::success(orders))
}
