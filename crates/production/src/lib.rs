//! Order production use cases.
//!
//! [`OrderProductionService`] validates caller input, loads and stores orders
//! through an [`order_store::OrderRepository`] and applies the domain rules:
//! - create an order from a payment notification
//! - get an order by id, or every order in a state
//! - move an order to a new state

pub mod contract;
pub mod error;
pub mod service;

pub use contract::{
    CreateOrderProductionInput, CreateOrderProductionItemInput, GetOrderProductionByIdInput,
    GetOrderProductionByStateInput, UpdateOrderProductionInput,
};
pub use error::{Result, ServiceError};
pub use service::OrderProductionService;
