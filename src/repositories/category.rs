use sqlx::PgConnection;

use crate::database::models::Category;
use crate::database::{DatabaseError, Repository};

#[derive(Clone, Default)]
pub struct CategoryRepository {
    base: Repository<Category>,
}

impl CategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, conn: &mut PgConnection, name: &str) -> Result<Category, DatabaseError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(conn)
        .await?;
        Ok(category)
    }

    pub async fn find_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<Category, DatabaseError> {
        self.base.find_by_id(conn, id).await
    }

    pub async fn find_by_name(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<Category>, DatabaseError> {
        self.base.find_by_column(conn, "name", name).await
    }

    pub async fn update_name(
        &self,
        conn: &mut PgConnection,
        id: i64,
        name: &str,
    ) -> Result<Category, DatabaseError> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, updated_at = NOW() WHERE id = $1
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(conn)
        .await?;
        category.ok_or_else(|| DatabaseError::NotFound(format!("categories {id}")))
    }

    pub async fn delete(&self, conn: &mut PgConnection, id: i64) -> Result<(), DatabaseError> {
        self.base.delete_by_id(conn, id).await
    }

    pub async fn page(
        &self,
        conn: &mut PgConnection,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Category>, DatabaseError> {
        self.base.page(conn, offset, limit).await
    }

    pub async fn count(&self, conn: &mut PgConnection) -> Result<i64, DatabaseError> {
        self.base.count(conn).await
    }
}
