pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;
pub use store::OrderRepository;
