pub mod manager;
pub mod models;
pub mod repository;
pub mod transaction;

pub use manager::{connect, health_check, migrate, DatabaseError};
pub use repository::{Entity, Repository};
pub use transaction::TxScope;
