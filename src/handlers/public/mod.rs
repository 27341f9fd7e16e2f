// handlers/public/mod.rs - Handlers reachable without a bearer token

pub mod auth;
pub mod health;

pub use auth::{login, register};
pub use health::health;
