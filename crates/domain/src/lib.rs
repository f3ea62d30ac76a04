//! Domain layer for order creation.
//!
//! This crate provides:
//! - Request validation for new orders
//! - The order assembler, which prices lines against a product snapshot
//! - Order number sequencing
//! - `OrderService`, which runs each creation as one atomic unit of work
//!   against an [`InventoryStore`](store::InventoryStore) with bounded retries

pub mod config;
pub mod error;
pub mod order;

pub use config::OrderingConfig;
pub use error::{Entity, OrderError};
pub use order::{
    AssembledOrder, CreateOrderRequest, OrderAssembler, OrderLineRequest, OrderNumber,
    OrderService, ProductSnapshot,
};
