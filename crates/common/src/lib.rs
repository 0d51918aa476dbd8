//! Shared types for the order production service.

pub mod clock;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use types::{ItemId, OrderId};
