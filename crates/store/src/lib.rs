//! Inventory store for the order-management backend.
//!
//! Holds buyers, products and orders, and provides the atomic unit of work
//! ([`StoreTransaction`]) that order creation runs inside. Stock only ever
//! changes through the conditional [`StoreTransaction::decrement_stock`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{
    Buyer, BuyerId, Money, NewOrder, NewOrderLine, Order, OrderId, OrderLine, OrderStatus,
    Product, ProductId,
};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{DecrementOutcome, InventoryStore, StoreTransaction};
