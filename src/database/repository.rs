use sqlx::{postgres::PgRow, FromRow, PgConnection};

use crate::database::manager::DatabaseError;

/// Table metadata a row type provides so [`Repository`] can build its queries.
/// Every string here is a compile-time constant; no caller input is ever
/// spliced into SQL.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Table targeted by `DELETE` and `COUNT`.
    const TABLE: &'static str;
    /// `SELECT ... FROM ...` clause (joins included) without `WHERE`.
    const SELECT: &'static str;
    /// Primary key column as it appears in `SELECT`.
    const KEY: &'static str;
    /// Stable ordering for paging.
    const ORDER_BY: &'static str;
}

/// Shared data access over one entity. Concrete repositories hold one of
/// these and forward to it from their own declared methods.
pub struct Repository<T> {
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> Repository<T> {
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> {

    pub async fn find_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<T, DatabaseError> {
        let sql = format!("{} WHERE {} = $1", T::SELECT, T::KEY);
        match sqlx::query_as::<_, T>(&sql).bind(id).fetch_one(conn).await {
            Ok(row) => Ok(row),
            Err(sqlx::Error::RowNotFound) => {
                Err(DatabaseError::NotFound(format!("{} {}", T::TABLE, id)))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// First row whose `column` equals `value`. `column` must be one of the
    /// entity's own constant column names.
    pub async fn find_by_column(
        &self,
        conn: &mut PgConnection,
        column: &'static str,
        value: &str,
    ) -> Result<Option<T>, DatabaseError> {
        let sql = format!("{} WHERE {} = $1 ORDER BY {} LIMIT 1", T::SELECT, column, T::ORDER_BY);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(value)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn page(
        &self,
        conn: &mut PgConnection,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("{} ORDER BY {} LIMIT $1 OFFSET $2", T::SELECT, T::ORDER_BY);
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self, conn: &mut PgConnection) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(conn).await?;
        Ok(count)
    }

    pub async fn delete_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(conn).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {}", T::TABLE, id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Book, Category, User};

    #[derive(Clone, Default)]
    struct Holder {
        books: Repository<Book>,
        categories: Repository<Category>,
        users: Repository<User>,
    }

    #[test]
    fn repositories_can_be_defaulted_and_cloned() {
        let holder = Holder::default();
        let copy = holder.clone();
        let _ = (copy.books, copy.categories, copy.users);
        assert_eq!(Book::TABLE, "books");
        assert_eq!(Category::TABLE, "categories");
    }
}
