//! Domain layer for the order production service.
//!
//! This crate provides:
//! - The [`Order`] aggregate with its [`Item`]s
//! - The [`OrderState`] transition graph
//! - [`OrderError`] for rule violations

pub mod order;

pub use order::{Item, Order, OrderError, OrderState};
