// services/category_service.rs - category CRUD with name uniqueness
use sqlx::PgPool;

use crate::database::models::Category;
use crate::database::DatabaseError;
use crate::repositories::CategoryRepository;
use crate::services::error::ServiceError;
use crate::types::{Page, Pagination};

pub const MAX_CATEGORY_NAME: usize = 100;

#[derive(Clone)]
pub struct CategoryService {
    pool: PgPool,
    categories: CategoryRepository,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            categories: CategoryRepository::new(),
        }
    }

    pub async fn create(&self, name: &str) -> Result<Category, ServiceError> {
        let name = normalize_name(name)?;
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;

        if self.categories.find_by_name(&mut conn, &name).await?.is_some() {
            return Err(name_taken());
        }
        match self.categories.insert(&mut conn, &name).await {
            Ok(category) => {
                tracing::info!(category_id = category.id, name = %category.name, "category created");
                Ok(category)
            }
            Err(e) if e.is_unique_violation() => Err(name_taken()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self, pagination: Pagination) -> Result<Page<Category>, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let items = self
            .categories
            .page(&mut conn, pagination.offset(), pagination.size)
            .await?;
        let total = self.categories.count(&mut conn).await?;
        Ok(Page::new(items, pagination, total))
    }

    pub async fn update(&self, id: i64, name: &str) -> Result<Category, ServiceError> {
        let name = normalize_name(name)?;
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;

        match self.categories.find_by_id(&mut conn, id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Err(not_found(id)),
            Err(e) => return Err(e.into()),
        }
        // Renaming a category to its current name is not a conflict.
        if let Some(existing) = self.categories.find_by_name(&mut conn, &name).await? {
            if existing.id != id {
                return Err(name_taken());
            }
        }
        match self.categories.update_name(&mut conn, id, &name).await {
            Ok(category) => Ok(category),
            Err(e) if e.is_not_found() => Err(not_found(id)),
            Err(e) if e.is_unique_violation() => Err(name_taken()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        match self.categories.delete(&mut conn, id).await {
            Ok(()) => {
                tracing::info!(category_id = id, "category deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(not_found(id)),
            Err(e) if e.is_foreign_key_violation() => Err(ServiceError::conflict(
                "category_id",
                "category still has books and cannot be deleted",
            )),
            Err(e) => Err(e.into()),
        }
    }
}

fn not_found(id: i64) -> ServiceError {
    ServiceError::not_found(format!("category not found: {id}"))
}

fn name_taken() -> ServiceError {
    ServiceError::conflict("name", "category name already exists")
}

pub fn normalize_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid_field("name", "name is required"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME {
        return Err(ServiceError::invalid_field(
            "name",
            format!("name must be at most {MAX_CATEGORY_NAME} characters"),
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(normalize_name("  Fiction ").unwrap(), "Fiction");
    }

    #[test]
    fn blank_and_long_names_are_rejected() {
        assert!(normalize_name("   ").is_err());
        assert!(normalize_name(&"x".repeat(MAX_CATEGORY_NAME)).is_ok());
        assert!(normalize_name(&"x".repeat(MAX_CATEGORY_NAME + 1)).is_err());
    }

    #[test]
    fn duplicate_name_is_a_field_conflict() {
        match name_taken() {
            ServiceError::Conflict { field, .. } => assert_eq!(field, "name"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
