use sqlx::PgConnection;

use crate::database::models::{Book, NewBook, PriceStats};
use crate::database::{DatabaseError, Repository};

#[derive(Clone, Default)]
pub struct BookRepository {
    base: Repository<Book>,
}

impl BookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the row and returns it re-read with its category joined.
    pub async fn insert(&self, conn: &mut PgConnection, book: &NewBook) -> Result<Book, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO books (title, author, price, year, category_id, image_base64)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price)
        .bind(book.year)
        .bind(book.category_id)
        .bind(&book.image_base64)
        .fetch_one(&mut *conn)
        .await?;

        self.base.find_by_id(conn, id).await
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        book: &NewBook,
    ) -> Result<Book, DatabaseError> {
        let result = sqlx::query(
            "UPDATE books
             SET title = $2, author = $3, price = $4, year = $5, category_id = $6, image_base64 = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price)
        .bind(book.year)
        .bind(book.category_id)
        .bind(&book.image_base64)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("books {id}")));
        }
        self.base.find_by_id(conn, id).await
    }

    pub async fn find_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<Book, DatabaseError> {
        self.base.find_by_id(conn, id).await
    }

    pub async fn find_by_title(
        &self,
        conn: &mut PgConnection,
        title: &str,
    ) -> Result<Option<Book>, DatabaseError> {
        self.base.find_by_column(conn, "b.title", title).await
    }

    pub async fn delete(&self, conn: &mut PgConnection, id: i64) -> Result<(), DatabaseError> {
        self.base.delete_by_id(conn, id).await
    }

    pub async fn page(
        &self,
        conn: &mut PgConnection,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Book>, DatabaseError> {
        self.base.page(conn, offset, limit).await
    }

    pub async fn count(&self, conn: &mut PgConnection) -> Result<i64, DatabaseError> {
        self.base.count(conn).await
    }

    pub async fn price_stats(&self, conn: &mut PgConnection) -> Result<PriceStats, DatabaseError> {
        let stats = sqlx::query_as::<_, PriceStats>(
            "SELECT COUNT(*) AS total_books,
                    MIN(price) AS min_price,
                    MAX(price) AS max_price,
                    ROUND(AVG(price), 2) AS avg_price
             FROM books",
        )
        .fetch_one(conn)
        .await?;
        Ok(stats)
    }
}
