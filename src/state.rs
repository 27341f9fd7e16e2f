use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{JwtError, JwtService};
use crate::config::AppConfig;
use crate::services::{BookService, CategoryService, OrderService, UserService};

/// Everything a request handler may need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub jwt: Arc<JwtService>,
    pub users: UserService,
    pub categories: CategoryService,
    pub books: BookService,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = Arc::new(JwtService::new(&config.jwt)?);
        Ok(Self {
            users: UserService::new(pool.clone(), jwt.clone()),
            categories: CategoryService::new(pool.clone()),
            books: BookService::new(pool.clone()),
            orders: OrderService::new(pool.clone()),
            config: Arc::new(config),
            pool,
            jwt,
        })
    }
}
