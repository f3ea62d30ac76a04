use async_trait::async_trait;
use common::{Buyer, BuyerId, NewOrder, Order, OrderId, Product, ProductId};

use crate::Result;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Stock was reduced; `remaining` is the new level inside the unit.
    Applied { remaining: u32 },
    /// Stock was left untouched because fewer than the requested units
    /// were available at decrement time.
    Insufficient { available: u32 },
}

/// Core trait for inventory store implementations.
///
/// Holds buyers, products and orders. Reads here see committed state only;
/// every mutation that belongs to order creation goes through a
/// [`StoreTransaction`] obtained from [`InventoryStore::begin`].
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Looks up a buyer, active or not.
    async fn get_buyer(&self, id: BuyerId) -> Result<Option<Buyer>>;

    /// Looks up a product, active or not.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Loads an order with its lines, including soft-deleted orders.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads an order by its human-facing number.
    async fn get_order_by_number(&self, order_number: &str) -> Result<Option<Order>>;

    /// Returns the active orders of a buyer, oldest first.
    async fn orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>>;

    /// Soft-deletes an order. Returns false if it doesn't exist.
    ///
    /// The order number stays reserved.
    async fn deactivate_order(&self, id: OrderId) -> Result<bool>;

    /// Opens an atomic unit of work.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// An atomic unit of work against the store.
///
/// Writes become visible to others only after [`commit`](Self::commit).
/// Dropping the unit without committing discards every write made through it.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Reads a product as of now, including writes made in this unit.
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Returns the greatest order number ever issued, soft-deleted orders included.
    ///
    /// Order numbers are compared by length, then lexically, which matches
    /// numeric order for a fixed prefix with zero-padded suffixes. Concurrent
    /// units calling this are serialised until the first one finishes.
    async fn last_order_number(&mut self) -> Result<Option<String>>;

    /// Writes an order and its lines, assigning storage ids.
    async fn save_order(&mut self, order: NewOrder) -> Result<Order>;

    /// Reduces stock by `amount` only if at least `amount` units are available.
    async fn decrement_stock(&mut self, id: ProductId, amount: u32) -> Result<DecrementOutcome>;

    /// Makes every write of this unit visible atomically.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every write of this unit.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Sort key for order numbers; see [`StoreTransaction::last_order_number`].
///
/// Only meaningful for canonical numbers (fixed prefix, suffix zero-padded to
/// a fixed width and never beyond it). The PostgreSQL schema rejects anything
/// else, and a non-canonical maximum fails to parse when it is read back.
pub fn order_number_key(order_number: &str) -> (usize, &str) {
    (order_number.len(), order_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_key_orders_numerically() {
        let mut numbers = vec!["PED-1000000", "PED-000002", "PED-000010", "PED-000009"];
        numbers.sort_by_key(|n| order_number_key(n));
        assert_eq!(
            numbers,
            vec!["PED-000002", "PED-000009", "PED-000010", "PED-1000000"]
        );
    }
}
