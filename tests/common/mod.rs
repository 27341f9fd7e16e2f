#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use sqlx::PgPool;

use bookstore_api::config::AppConfig;
use bookstore_api::database::{self, models::Book, models::Category, models::User};
use bookstore_api::services::{BookInput, RegisterInput};
use bookstore_api::AppState;

pub const PASSWORD: &str = "Str0ng!pass";

/// Development config pointed at `DATABASE_URL`, or `None` when it is unset.
pub fn test_config() -> Option<AppConfig> {
    let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;
    let mut config = AppConfig::development();
    config.database.url = Some(url);
    config.database.max_connections = 5;
    config.database.connection_timeout = 10;
    Some(config)
}

/// Connected, migrated state; `None` means the database tests should skip.
pub async fn test_state() -> Result<Option<AppState>> {
    let Some(config) = test_config() else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return Ok(None);
    };
    let pool = database::connect(&config.database).await?;
    database::migrate(&pool).await?;
    Ok(Some(AppState::new(config, pool)?))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

pub async fn seed_user(state: &AppState) -> Result<User> {
    let user = state
        .users
        .register(RegisterInput {
            name: "Reader".to_string(),
            email: format!("{}@example.com", unique("reader")),
            password: PASSWORD.to_string(),
        })
        .await?;
    Ok(user)
}

pub async fn seed_category(state: &AppState) -> Result<Category> {
    Ok(state.categories.create(&unique("genre")).await?)
}

pub async fn seed_book(state: &AppState, category: &Category, price: &str) -> Result<Book> {
    let book = state
        .books
        .create(
            BookInput {
                title: unique("title"),
                author: "Test Author".to_string(),
                price: dec(price),
                year: Some(2001),
                category_id: category.id,
            },
            Some(b"cover".to_vec()),
        )
        .await?;
    Ok(book)
}

/// Rewrites an order's creation time, for expiry tests.
pub async fn backdate_order(pool: &PgPool, order_id: i64, minutes: i64) -> Result<()> {
    sqlx::query("UPDATE orders SET created_at = NOW() - make_interval(mins => $2::int) WHERE id = $1")
        .bind(order_id)
        .bind(minutes as i32)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_orders(pool: &PgPool, user_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// The router served on a free local port inside the current test runtime.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    pub async fn start(state: AppState) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let app = bookstore_api::app(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self { port, base_url };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
