use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::database::models::{NewOrderLine, Order, OrderLine, OrderStatus, OrderWithLines};
use crate::database::DatabaseError;

const ORDER_COLUMNS: &str = "id, user_id, total_price, status, created_at, updated_at";

const LINE_SELECT: &str = "SELECT bo.order_id, bo.book_id, b.title, bo.quantity, bo.unit_price,
            bo.quantity * bo.unit_price AS sub_total
     FROM book_orders bo JOIN books b ON b.id = bo.book_id";

#[derive(Clone, Default)]
pub struct OrderRepository;

impl OrderRepository {
    pub fn new() -> Self {
        Self
    }

    /// Inserts the order header in `PENDING` state.
    pub async fn insert_order(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        total_price: Decimal,
    ) -> Result<Order, DatabaseError> {
        let sql = format!(
            "INSERT INTO orders (user_id, total_price, status) VALUES ($1, $2, $3) RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .bind(total_price)
            .bind(OrderStatus::Pending)
            .fetch_one(conn)
            .await?;
        Ok(order)
    }

    pub async fn insert_line(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
        line: &NewOrderLine,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO book_orders (book_id, order_id, quantity, unit_price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(line.book_id)
        .bind(order_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
    ) -> Result<OrderWithLines, DatabaseError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("orders {order_id}")))?;

        let lines = self.lines_for(conn, &[order.id]).await?;
        Ok(OrderWithLines { order, lines })
    }

    /// All orders owned by `user_id`, newest first.
    pub async fn list_by_user(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
    ) -> Result<Vec<OrderWithLines>, DatabaseError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for line in self.lines_for(conn, &ids).await? {
            grouped.entry(line.order_id).or_default().push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = grouped.remove(&order.id).unwrap_or_default();
                OrderWithLines { order, lines }
            })
            .collect())
    }

    async fn lines_for(
        &self,
        conn: &mut PgConnection,
        order_ids: &[i64],
    ) -> Result<Vec<OrderLine>, DatabaseError> {
        let sql = format!("{LINE_SELECT} WHERE bo.order_id = ANY($1) ORDER BY bo.order_id, bo.book_id");
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(order_ids)
            .fetch_all(conn)
            .await?;
        Ok(lines)
    }

    /// Compare-and-swap on the status column. Succeeds only if the row still
    /// holds `from`; otherwise reports `NotFound` and leaves the row untouched.
    pub async fn update_status(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2",
        )
        .bind(order_id)
        .bind(from)
        .bind(to)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "orders {order_id} in state {from}"
            )));
        }
        Ok(())
    }

    /// Cancels every order still `PENDING` and created before `cutoff`.
    /// The status is re-checked by the `WHERE` clause, so a payment that
    /// committed first is never overwritten.
    pub async fn cancel_expired(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = NOW()
             WHERE status = $2 AND created_at < $3",
        )
        .bind(OrderStatus::Cancelled)
        .bind(OrderStatus::Pending)
        .bind(cutoff)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
