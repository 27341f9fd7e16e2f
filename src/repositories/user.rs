use sqlx::PgConnection;

use crate::database::models::User;
use crate::database::{DatabaseError, Repository};

#[derive(Clone, Default)]
pub struct UserRepository {
    base: Repository<User>,
}

impl UserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(conn)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<User, DatabaseError> {
        self.base.find_by_id(conn, id).await
    }

    pub async fn find_by_email(
        &self,
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<User>, DatabaseError> {
        self.base.find_by_column(conn, "email", email).await
    }
}
