use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_JWT_SECRET: &str = "bookstore-dev-secret";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY must be set in production")]
    DefaultSecretInProduction,

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub jwt: JwtConfig,
    pub orders: OrderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. When set it wins over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub expire_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    pub sweep_interval_secs: u64,
    pub expiry_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DB_PASS") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Web overrides
        if let Some(v) = env::var("WEB_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.web.port = v.parse().unwrap_or(self.web.port);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.web.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // JWT overrides
        if let Ok(v) = env::var("JWT_SECRET_KEY") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.jwt.issuer = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRE_DURATION") {
            self.jwt.expire_minutes = v.parse().unwrap_or(self.jwt.expire_minutes);
        }

        // Order lifecycle overrides
        if let Ok(v) = env::var("ORDER_SWEEP_INTERVAL_SECS") {
            self.orders.sweep_interval_secs = v.parse().unwrap_or(self.orders.sweep_interval_secs);
        }
        if let Ok(v) = env::var("ORDER_EXPIRY_MINUTES") {
            self.orders.expiry_minutes = v.parse().unwrap_or(self.orders.expiry_minutes);
        }

        self
    }

    /// Reject settings the server cannot safely run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production
            && (self.jwt.secret.is_empty() || self.jwt.secret == DEFAULT_JWT_SECRET)
        {
            return Err(ConfigError::DefaultSecretInProduction);
        }
        if self.jwt.expire_minutes <= 0 {
            return Err(ConfigError::NotPositive("JWT_EXPIRE_DURATION"));
        }
        if self.orders.sweep_interval_secs == 0 {
            return Err(ConfigError::NotPositive("ORDER_SWEEP_INTERVAL_SECS"));
        }
        if self.orders.expiry_minutes <= 0 {
            return Err(ConfigError::NotPositive("ORDER_EXPIRY_MINUTES"));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: String::new(),
                name: "bookstore".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            web: WebConfig {
                port: 3000,
                cors_origins: Vec::new(),
            },
            jwt: JwtConfig {
                secret: DEFAULT_JWT_SECRET.to_string(),
                issuer: "bookstore-api".to_string(),
                expire_minutes: 60,
            },
            orders: OrderConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 30,
                connection_timeout: 5,
                ..Self::development().database
            },
            web: WebConfig {
                port: 8080,
                cors_origins: Vec::new(),
            },
            jwt: JwtConfig {
                secret: String::new(),
                issuer: "bookstore-api".to_string(),
                expire_minutes: 60,
            },
            orders: OrderConfig::default(),
        }
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 120,
            expiry_minutes: 15,
        }
    }
}

impl OrderConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn grace_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.expiry_minutes)
    }
}

impl DatabaseConfig {
    /// Connection URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        match &self.url {
            Some(url) => {
                let Some((scheme, rest)) = url.split_once("://") else {
                    return url.clone();
                };
                match rest.rsplit_once('@') {
                    Some((credentials, host)) => {
                        let user = credentials.split_once(':').map_or(credentials, |(u, _)| u);
                        format!("{scheme}://{user}:***@{host}")
                    }
                    None => url.clone(),
                }
            }
            None => format!(
                "postgres://{}:***@{}:{}/{}",
                self.user, self.host, self.port, self.name
            ),
        }
    }
}
