// services/order_service.rs - order placement, payment and history
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use crate::database::models::{NewOrderLine, OrderStatus, OrderWithLines};
use crate::database::TxScope;
use crate::repositories::{BookRepository, OrderRepository};
use crate::services::error::ServiceError;

/// Upper bound for a single line and for the whole order.
pub const MAX_ITEMS_PER_ORDER: i32 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub book_id: i64,
    pub quantity: i32,
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    books: BookRepository,
    orders: OrderRepository,
}

impl OrderService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            books: BookRepository::new(),
            orders: OrderRepository::new(),
        }
    }

    /// Prices every line from the current book price and persists the order
    /// with all of its lines in one transaction.
    pub async fn create_order(
        &self,
        requester_id: i64,
        items: &[OrderItemInput],
    ) -> Result<OrderWithLines, ServiceError> {
        let items = normalize_items(items)?;

        let mut tx = TxScope::begin(&self.pool, "create_order").await?;

        let mut lines = Vec::with_capacity(items.len());
        for (book_id, quantity) in items {
            let found = self.books.find_by_id(tx.conn(), book_id).await;
            let book = match found {
                Ok(book) => book,
                Err(e) if e.is_not_found() => {
                    tx.rollback().await?;
                    return Err(ServiceError::invalid_field(
                        "book_id",
                        format!("book not found: {book_id}"),
                    ));
                }
                Err(e) => return Err(e.into()),
            };
            lines.push(NewOrderLine {
                book_id,
                quantity,
                unit_price: book.price,
            });
        }

        let total = order_total(&lines);
        let order = self.orders.insert_order(tx.conn(), requester_id, total).await?;
        for line in &lines {
            self.orders.insert_line(tx.conn(), order.id, line).await?;
        }
        let created = self.orders.find_by_id(tx.conn(), order.id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = created.order.id,
            user_id = requester_id,
            total = %created.order.total_price,
            "order created"
        );
        Ok(created)
    }

    pub async fn pay_order(
        &self,
        order_id: i64,
        requester_id: i64,
    ) -> Result<OrderWithLines, ServiceError> {
        let mut tx = TxScope::begin(&self.pool, "pay_order").await?;

        let found = self.orders.find_by_id(tx.conn(), order_id).await;
        let current = match found {
            Ok(found) => found,
            Err(e) if e.is_not_found() => {
                tx.rollback().await?;
                return Err(ServiceError::not_found(format!("order not found: {order_id}")));
            }
            Err(e) => return Err(e.into()),
        };

        if current.order.user_id != requester_id {
            tx.rollback().await?;
            return Err(ServiceError::Forbidden(
                "you are not allowed to pay this order".to_string(),
            ));
        }
        if let Err(e) = ensure_payable(current.order.status) {
            tx.rollback().await?;
            return Err(e);
        }

        match self
            .orders
            .update_status(tx.conn(), order_id, OrderStatus::Pending, OrderStatus::Paid)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                return Err(ServiceError::not_found(format!("order not found: {order_id}")));
            }
            Err(e) => return Err(e.into()),
        }

        let paid = self.orders.find_by_id(tx.conn(), order_id).await?;
        tx.commit().await?;

        tracing::info!(order_id, user_id = requester_id, "order paid");
        Ok(paid)
    }

    pub async fn list_orders_by_user(&self, user_id: i64) -> Result<Vec<OrderWithLines>, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(crate::database::DatabaseError::from)?;
        let orders = self.orders.list_by_user(&mut conn, user_id).await?;
        Ok(orders)
    }
}

/// Validates the requested lines and folds repeated book ids into one line.
/// First-seen order of book ids is preserved.
pub fn normalize_items(items: &[OrderItemInput]) -> Result<Vec<(i64, i32)>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::invalid_field(
            "items",
            "order must contain at least one item",
        ));
    }
    // Every line holds at least one book, so a longer list can never fit.
    if items.len() > MAX_ITEMS_PER_ORDER as usize {
        return Err(too_many_books());
    }

    let mut field_errors = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        if !(1..=MAX_ITEMS_PER_ORDER).contains(&item.quantity) {
            field_errors.insert(
                format!("items[{i}].quantity"),
                format!("quantity must be between 1 and {MAX_ITEMS_PER_ORDER}"),
            );
        }
    }
    if !field_errors.is_empty() {
        return Err(ServiceError::validation("invalid order items", field_errors));
    }

    let mut merged: Vec<(i64, i32)> = Vec::with_capacity(items.len());
    let mut total_quantity = 0;
    for item in items {
        total_quantity += item.quantity;
        if total_quantity > MAX_ITEMS_PER_ORDER {
            return Err(too_many_books());
        }
        match merged.iter_mut().find(|(book_id, _)| *book_id == item.book_id) {
            Some((_, quantity)) => *quantity += item.quantity,
            None => merged.push((item.book_id, item.quantity)),
        }
    }
    Ok(merged)
}

fn too_many_books() -> ServiceError {
    ServiceError::invalid_field(
        "items",
        format!("an order may contain at most {MAX_ITEMS_PER_ORDER} books in total"),
    )
}

pub fn line_subtotal(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

pub fn order_total(lines: &[NewOrderLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line_subtotal(line.unit_price, line.quantity))
        .sum()
}

pub fn ensure_payable(status: OrderStatus) -> Result<(), ServiceError> {
    match status {
        OrderStatus::Pending => Ok(()),
        other => Err(ServiceError::OrderNotPayable(other)),
    }
}
