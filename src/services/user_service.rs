// services/user_service.rs - registration and login
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::auth::{hash_password, validate_password_strength, verify_password, JwtService};
use crate::database::models::User;
use crate::database::DatabaseError;
use crate::repositories::UserRepository;
use crate::services::error::ServiceError;

const INVALID_CREDENTIALS: &str = "invalid email or password";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    users: UserRepository,
    jwt: Arc<JwtService>,
}

impl UserService {
    pub fn new(pool: PgPool, jwt: Arc<JwtService>) -> Self {
        Self {
            pool,
            users: UserRepository::new(),
            jwt,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<User, ServiceError> {
        let input = RegisterInput {
            name: input.name.trim().to_string(),
            email: normalize_email(&input.email),
            password: input.password,
        };
        input.validate()?;
        validate_password_strength(&input.password)
            .map_err(|problem| ServiceError::invalid_field("password", problem))?;

        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        if self.users.find_by_email(&mut conn, &input.email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = hash_off_runtime(input.password.clone()).await?;

        match self
            .users
            .insert(&mut conn, &input.name, &input.email, &password_hash)
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = user.id, "user registered");
                Ok(user)
            }
            Err(e) if e.is_unique_violation() => Err(email_taken()),
            Err(e) => Err(e.into()),
        }
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, ServiceError> {
        let input = LoginInput {
            email: normalize_email(&input.email),
            password: input.password,
        };
        input.validate()?;

        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let verified = match self.users.find_by_email(&mut conn, &input.email).await? {
            Some(user) => verify_off_runtime(input.password.clone(), user.password_hash.clone())
                .await?
                .then_some(user),
            None => None,
        };
        let user = verified.ok_or_else(|| {
            tracing::debug!(email = %input.email, "login rejected");
            ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string())
        })?;

        let issued = self.jwt.issue(user.id).map_err(|e| {
            tracing::error!(error = %e, user_id = user.id, "token issuance failed");
            ServiceError::internal("could not issue token")
        })?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok(LoginOutcome {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<User, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        match self.users.find_by_id(&mut conn, id).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => Err(ServiceError::not_found(format!("user not found: {id}"))),
            Err(e) => Err(e.into()),
        }
    }
}

// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_off_runtime(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            ServiceError::internal("could not process password")
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ServiceError::internal("could not process password")
        })
}

async fn verify_off_runtime(password: String, hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verification task failed");
            ServiceError::internal("could not verify password")
        })
}

fn email_taken() -> ServiceError {
    ServiceError::conflict("email", "email already registered")
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_case_folded() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn register_input_rules() {
        let ok = RegisterInput {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Str0ng!pass".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterInput {
            name: String::new(),
            email: "nope".to_string(),
            ..ok
        };
        let err: ServiceError = bad.validate().unwrap_err().into();
        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("name"));
                assert!(field_errors.contains_key("email"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_the_runtime_free() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = ticks.clone();
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            }
        });

        let hash = hash_off_runtime("Str0ng!pass".to_string()).await.unwrap();
        assert!(ticks.load(Ordering::Relaxed) > 0);

        assert!(verify_off_runtime("Str0ng!pass".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_off_runtime("Wr0ng!pass".to_string(), hash).await.unwrap());
        ticker.abort();
    }
}
