pub mod book_service;
pub mod category_service;
pub mod error;
pub mod order_service;
pub mod order_sweeper;
pub mod user_service;

pub use book_service::{BookInput, BookPatch, BookService};
pub use category_service::CategoryService;
pub use error::{FieldErrors, ServiceError};
pub use order_service::{OrderItemInput, OrderService};
pub use order_sweeper::OrderSweeper;
pub use user_service::{LoginInput, LoginOutcome, RegisterInput, UserService};
