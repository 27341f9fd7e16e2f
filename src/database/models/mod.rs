pub mod book;
pub mod category;
pub mod order;
pub mod user;

pub use book::{Book, NewBook, PriceStats};
pub use category::Category;
pub use order::{NewOrderLine, Order, OrderLine, OrderStatus, OrderWithLines};
pub use user::User;
