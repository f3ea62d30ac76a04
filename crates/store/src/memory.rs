use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{Buyer, BuyerId, Money, NewOrder, Order, OrderId, Product, ProductId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result, StoreError,
    store::{DecrementOutcome, InventoryStore, StoreTransaction, order_number_key},
};

#[derive(Debug, Default)]
struct MemoryState {
    buyers: HashMap<BuyerId, Buyer>,
    products: HashMap<ProductId, Product>,
    orders: Vec<Order>,
    next_buyer_id: i64,
    next_product_id: i64,
    next_order_id: i64,
    next_line_id: i64,
}

impl MemoryState {
    fn find_order(&self, predicate: impl Fn(&Order) -> bool) -> Option<Order> {
        self.orders.iter().find(|o| predicate(o)).cloned()
    }
}

#[derive(Debug, Default)]
struct Faults {
    failing_commits: AtomicU32,
    write_delay_ms: AtomicU64,
}

/// In-memory inventory store for testing and local runs.
///
/// A transaction holds the state lock for its whole lifetime, so units of
/// work are fully serialised. Writes are staged inside the transaction and
/// applied on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a buyer and returns it with its assigned id.
    pub async fn insert_buyer(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        active: bool,
    ) -> Buyer {
        let mut state = self.state.lock().await;
        state.next_buyer_id += 1;
        let buyer = Buyer {
            id: BuyerId::new(state.next_buyer_id),
            name: name.into(),
            email: email.into(),
            active,
        };
        state.buyers.insert(buyer.id, buyer.clone());
        buyer
    }

    /// Adds an active product to the catalog and returns it with its assigned id.
    pub async fn insert_product(
        &self,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Product {
        let mut state = self.state.lock().await;
        state.next_product_id += 1;
        let product = Product {
            id: ProductId::new(state.next_product_id),
            name: name.into(),
            price,
            stock,
            active: true,
        };
        state.products.insert(product.id, product.clone());
        product
    }

    /// Changes a product's catalog price. Returns false if it doesn't exist.
    pub async fn set_product_price(&self, id: ProductId, price: Money) -> bool {
        let mut state = self.state.lock().await;
        match state.products.get_mut(&id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    /// Marks a product as inactive. Returns false if it doesn't exist.
    pub async fn deactivate_product(&self, id: ProductId) -> bool {
        let mut state = self.state.lock().await;
        match state.products.get_mut(&id) {
            Some(product) => {
                product.active = false;
                true
            }
            None => false,
        }
    }

    /// Returns the committed stock of a product.
    pub async fn product_stock(&self, id: ProductId) -> Option<u32> {
        self.state.lock().await.products.get(&id).map(|p| p.stock)
    }

    /// Returns the total number of orders stored, soft-deleted ones included.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Makes the next `count` commits fail with a conflict.
    pub fn fail_next_commits(&self, count: u32) {
        self.faults.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Delays every order write by `delay` while the state lock is held.
    pub fn set_write_delay(&self, delay: Duration) {
        self.faults
            .write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn get_buyer(&self, id: BuyerId) -> Result<Option<Buyer>> {
        Ok(self.state.lock().await.buyers.get(&id).cloned())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().await.find_order(|o| o.id == id))
    }

    async fn get_order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        Ok(self
            .state
            .lock()
            .await
            .find_order(|o| o.order_number == order_number))
    }

    async fn orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| o.buyer_id == buyer_id && o.active)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn deactivate_order(&self, id: OrderId) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let state = self.state.clone().lock_owned().await;
        let next_order_id = state.next_order_id;
        let next_line_id = state.next_line_id;
        Ok(Box::new(InMemoryTransaction {
            state,
            faults: self.faults.clone(),
            stock: HashMap::new(),
            orders: Vec::new(),
            next_order_id,
            next_line_id,
        }))
    }
}

/// Unit of work over [`InMemoryStore`].
pub struct InMemoryTransaction {
    state: OwnedMutexGuard<MemoryState>,
    faults: Arc<Faults>,
    stock: HashMap<ProductId, u32>,
    orders: Vec<Order>,
    next_order_id: i64,
    next_line_id: i64,
}

impl InMemoryTransaction {
    fn current_stock(&self, product: &Product) -> u32 {
        self.stock.get(&product.id).copied().unwrap_or(product.stock)
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.products.get(&id).map(|p| Product {
            stock: self.current_stock(p),
            ..p.clone()
        }))
    }

    async fn last_order_number(&mut self) -> Result<Option<String>> {
        Ok(self
            .state
            .orders
            .iter()
            .chain(self.orders.iter())
            .map(|o| o.order_number.as_str())
            .max_by_key(|n| order_number_key(n))
            .map(String::from))
    }

    async fn save_order(&mut self, order: NewOrder) -> Result<Order> {
        let delay = self.faults.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let taken = self
            .state
            .orders
            .iter()
            .chain(self.orders.iter())
            .any(|o| o.order_number == order.order_number);
        if taken {
            return Err(StoreError::Conflict {
                reason: format!("order number {} already issued", order.order_number),
            });
        }

        self.next_order_id += 1;
        let order_id = OrderId::new(self.next_order_id);
        let first_line_id = self.next_line_id + 1;
        self.next_line_id += order.lines.len() as i64;

        let order = order.into_order(order_id, first_line_id..);
        self.orders.push(order.clone());
        Ok(order)
    }

    async fn decrement_stock(&mut self, id: ProductId, amount: u32) -> Result<DecrementOutcome> {
        let available = match self.state.products.get(&id) {
            Some(product) => self.current_stock(product),
            None => return Ok(DecrementOutcome::Insufficient { available: 0 }),
        };

        if available < amount {
            return Ok(DecrementOutcome::Insufficient { available });
        }

        let remaining = available - amount;
        self.stock.insert(id, remaining);
        Ok(DecrementOutcome::Applied { remaining })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let injected = self
            .faults
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            tracing::debug!("injected commit failure");
            return Err(StoreError::Conflict {
                reason: "injected commit failure".to_string(),
            });
        }

        let InMemoryTransaction {
            mut state,
            stock,
            orders,
            next_order_id,
            next_line_id,
            ..
        } = *self;

        for (id, remaining) in stock {
            if let Some(product) = state.products.get_mut(&id) {
                product.stock = remaining;
            }
        }
        state.orders.extend(orders);
        state.next_order_id = next_order_id;
        state.next_line_id = next_line_id;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
