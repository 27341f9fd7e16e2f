pub mod book;
pub mod category;
pub mod order;
pub mod user;

pub use book::BookRepository;
pub use category::CategoryRepository;
pub use order::OrderRepository;
pub use user::UserRepository;
