//! Order service: the single writer of order-creation units of work.

use std::time::Instant;

use chrono::Utc;
use common::{Buyer, BuyerId, Order, OrderId, Product, ProductId};
use store::{DecrementOutcome, InventoryStore, StoreTransaction};

use super::{CreateOrderRequest, OrderAssembler, OrderNumber, ProductSnapshot};
use crate::config::OrderingConfig;
use crate::error::{Entity, OrderError};

/// Service for creating and reading orders.
///
/// Each [`create_order`](Self::create_order) call runs the product reads,
/// number allocation, order insert and stock decrements inside one store
/// transaction. Either all of it commits or none of it is visible.
pub struct OrderService<S: InventoryStore> {
    store: S,
    assembler: OrderAssembler,
    config: OrderingConfig,
}

impl<S: InventoryStore> OrderService<S> {
    /// Creates a new order service with the default retry policy.
    pub fn new(store: S) -> Self {
        Self::with_config(store, OrderingConfig::default())
    }

    pub fn with_config(store: S, config: OrderingConfig) -> Self {
        Self {
            store,
            assembler: OrderAssembler::new(),
            config,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    /// Creates an order, retrying transient conflicts and timeouts.
    #[tracing::instrument(
        skip(self, request),
        fields(buyer_id = %request.buyer_id, lines = request.lines.len())
    )]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.create_with_retries(&request).await;

        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    total = %order.total,
                    "Order created"
                );
            }
            Err(e) => {
                metrics::counter!("order_creation_failures_total", "kind" => e.kind())
                    .increment(1);
                match e {
                    OrderError::Fatal { .. } | OrderError::Storage(_) => {
                        tracing::error!(error = %e, kind = e.kind(), "Order creation failed");
                    }
                    _ => {
                        tracing::warn!(error = %e, kind = e.kind(), "Order creation rejected");
                    }
                }
            }
        }

        result
    }

    async fn create_with_retries(&self, request: &CreateOrderRequest) -> Result<Order, OrderError> {
        request.validate()?;
        self.resolve_buyer(request.buyer_id).await?;

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(request).await {
                Ok(order) => return Ok(order),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    metrics::counter!("order_creation_retries_total").increment(1);
                    tracing::warn!(attempt, error = %e, "Retrying order creation");
                    attempt += 1;
                }
                Err(OrderError::Conflict { .. }) => {
                    return Err(OrderError::Conflict { attempts: attempt });
                }
                Err(OrderError::Timeout { .. }) => {
                    return Err(OrderError::Timeout { attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One attempt with fresh reads.
    ///
    /// The timeout covers everything up to the commit. Once a commit has been
    /// sent it is awaited to completion, since abandoning it would leave us not
    /// knowing whether the order exists.
    async fn attempt(&self, request: &CreateOrderRequest) -> Result<Order, OrderError> {
        let staged = tokio::time::timeout(self.config.attempt_timeout, self.stage(request)).await;

        // On timeout the staged future is dropped, and the open unit with it.
        let (tx, order) = staged.map_err(|_| OrderError::Timeout { attempts: 1 })??;

        tx.commit().await?;
        Ok(order)
    }

    /// Opens a unit and writes the order into it without committing.
    async fn stage(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<(Box<dyn StoreTransaction>, Order), OrderError> {
        let mut tx = self.store.begin().await?;

        match self.write_order(tx.as_mut(), request).await {
            Ok(order) => Ok((tx, order)),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn write_order(
        &self,
        tx: &mut dyn StoreTransaction,
        request: &CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        let mut snapshot = ProductSnapshot::new();
        for line in &request.lines {
            if snapshot.contains(line.product_id) {
                continue;
            }
            match tx.get_product(line.product_id).await? {
                Some(product) => snapshot.insert(product),
                None => break,
            }
        }

        let assembled = self.assembler.assemble(request, &snapshot)?;

        let last = tx.last_order_number().await?;
        let number = OrderNumber::next_after(last.as_deref())?;

        let order = tx
            .save_order(assembled.into_new_order(request, number, Utc::now()))
            .await?;

        for line in &order.lines {
            match tx.decrement_stock(line.product_id, line.quantity).await? {
                DecrementOutcome::Applied { remaining } => {
                    tracing::debug!(product_id = %line.product_id, remaining, "Stock decremented");
                }
                DecrementOutcome::Insufficient { available } => {
                    return Err(OrderError::InsufficientStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available,
                    });
                }
            }
        }

        Ok(order)
    }

    async fn resolve_buyer(&self, id: BuyerId) -> Result<Buyer, OrderError> {
        self.store
            .get_buyer(id)
            .await?
            .filter(|b| b.active)
            .ok_or_else(|| OrderError::not_found(Entity::Buyer, id))
    }

    /// Loads an order by id, including soft-deleted ones.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, OrderError> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| OrderError::not_found(Entity::Order, id))
    }

    /// Loads an order by its order number.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<Order, OrderError> {
        self.store
            .get_order_by_number(order_number)
            .await?
            .ok_or_else(|| OrderError::not_found(Entity::Order, order_number))
    }

    /// Lists the active orders of an existing buyer, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>, OrderError> {
        if self.store.get_buyer(buyer_id).await?.is_none() {
            return Err(OrderError::not_found(Entity::Buyer, buyer_id));
        }
        Ok(self.store.orders_for_buyer(buyer_id).await?)
    }

    /// Soft-deletes an order. Its number is never handed out again.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_order(&self, id: OrderId) -> Result<(), OrderError> {
        if self.store.deactivate_order(id).await? {
            tracing::info!(order_id = %id, "Order deactivated");
            Ok(())
        } else {
            Err(OrderError::not_found(Entity::Order, id))
        }
    }

    /// Reads a product with its current price and stock.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, OrderError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| OrderError::not_found(Entity::Product, id))
    }
}
