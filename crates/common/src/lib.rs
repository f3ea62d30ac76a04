//! Shared types for the order-management backend.
//!
//! Identifiers, the [`Money`] fixed-point amount, and the buyer, product and
//! order records that the store persists and the domain produces.

pub mod money;
pub mod records;
pub mod types;

pub use money::{Money, MoneyError};
pub use records::{
    Buyer, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, Product, UnknownStatus,
};
pub use types::{BuyerId, OrderId, ProductId};
