// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Every handler here can rely on an `AuthUser` request extension.

pub mod books;
pub mod categories;
pub mod me;
pub mod orders;
pub mod stats;
