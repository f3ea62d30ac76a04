//! Turns a request plus product reads into priced order lines.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{Money, NewOrder, NewOrderLine, OrderStatus, Product, ProductId};

use super::{CreateOrderRequest, OrderNumber};
use crate::error::{Entity, OrderError};

/// Products read inside the current attempt, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProductSnapshot {
    products: HashMap<ProductId, Product>,
}

impl ProductSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.products.contains_key(&id)
    }
}

impl FromIterator<Product> for ProductSnapshot {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for product in iter {
            snapshot.insert(product);
        }
        snapshot
    }
}

/// Priced lines and their total, not yet numbered or persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOrder {
    pub lines: Vec<NewOrderLine>,
    pub total: Money,
}

impl AssembledOrder {
    /// Attaches identity and request metadata, ready to be saved.
    pub fn into_new_order(
        self,
        request: &CreateOrderRequest,
        order_number: OrderNumber,
        created_at: DateTime<Utc>,
    ) -> NewOrder {
        NewOrder {
            buyer_id: request.buyer_id,
            order_number: order_number.to_string(),
            created_at,
            status: OrderStatus::Pending,
            total: self.total,
            comment: request.comment.clone(),
            delivery_address: request.delivery_address.clone(),
            lines: self.lines,
        }
    }
}

/// Validates requested lines against a product snapshot and prices them.
///
/// Lines are checked in request order and the first failure wins. Each
/// line is checked against the snapshot on its own, so two lines for the
/// same product may together ask for more than is in stock; the
/// conditional decrement catches that.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderAssembler;

impl OrderAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(
        &self,
        request: &CreateOrderRequest,
        snapshot: &ProductSnapshot,
    ) -> Result<AssembledOrder, OrderError> {
        let mut lines = Vec::with_capacity(request.lines.len());
        let mut total = Money::zero();

        for (i, line) in request.lines.iter().enumerate() {
            let product = snapshot
                .get(line.product_id)
                .filter(|p| p.active)
                .ok_or_else(|| OrderError::not_found(Entity::Product, line.product_id))?;

            if product.stock < line.quantity {
                return Err(OrderError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            if !product.price.is_positive() {
                return Err(OrderError::fatal(format!(
                    "product {} has non-positive price {}",
                    product.id, product.price
                )));
            }

            let overflow =
                || OrderError::invalid(format!("lines[{i}].quantity"), "order amount too large");
            let subtotal = product
                .price
                .checked_multiply(line.quantity)
                .ok_or_else(overflow)?;
            total = total.checked_add(subtotal).ok_or_else(overflow)?;

            lines.push(NewOrderLine {
                product_id: product.id,
                quantity: line.quantity,
                unit_price: product.price,
                subtotal,
            });
        }

        Ok(AssembledOrder { lines, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BuyerId;

    fn product(id: i64, cents: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::from_cents(cents),
            stock,
            active: true,
        }
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest::new(BuyerId::new(1))
    }

    #[test]
    fn prices_lines_and_sums_total() {
        let snapshot: ProductSnapshot =
            [product(1, 10000, 10), product(2, 5000, 10)].into_iter().collect();
        let request = request()
            .with_line(ProductId::new(1), 2)
            .with_line(ProductId::new(2), 1);

        let assembled = OrderAssembler::new().assemble(&request, &snapshot).unwrap();

        assert_eq!(assembled.lines.len(), 2);
        assert_eq!(assembled.lines[0].unit_price, Money::from_cents(10000));
        assert_eq!(assembled.lines[0].subtotal, Money::from_cents(20000));
        assert_eq!(assembled.lines[1].subtotal, Money::from_cents(5000));
        assert_eq!(assembled.total, Money::from_cents(25000));
    }

    #[test]
    fn missing_product_is_not_found() {
        let snapshot: ProductSnapshot = [product(1, 100, 10)].into_iter().collect();
        let request = request()
            .with_line(ProductId::new(1), 1)
            .with_line(ProductId::new(99), 1);

        let err = OrderAssembler::new()
            .assemble(&request, &snapshot)
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::NotFound { entity: Entity::Product, ref key } if key == "99"
        ));
    }

    #[test]
    fn inactive_product_is_not_found() {
        let mut retired = product(1, 100, 10);
        retired.active = false;
        let snapshot: ProductSnapshot = [retired].into_iter().collect();

        let err = OrderAssembler::new()
            .assemble(&request().with_line(ProductId::new(1), 1), &snapshot)
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound { .. }));
    }

    #[test]
    fn short_stock_reports_requested_and_available() {
        let snapshot: ProductSnapshot = [product(7, 100, 2)].into_iter().collect();

        let err = OrderAssembler::new()
            .assemble(&request().with_line(ProductId::new(7), 3), &snapshot)
            .unwrap_err();
        match err {
            OrderError::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, ProductId::new(7));
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn first_failing_line_wins() {
        let snapshot: ProductSnapshot = [product(1, 100, 1)].into_iter().collect();
        let request = request()
            .with_line(ProductId::new(1), 5)
            .with_line(ProductId::new(2), 1);

        let err = OrderAssembler::new()
            .assemble(&request, &snapshot)
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));
    }

    #[test]
    fn duplicate_lines_are_checked_against_the_same_snapshot() {
        let snapshot: ProductSnapshot = [product(1, 100, 3)].into_iter().collect();
        let request = request()
            .with_line(ProductId::new(1), 2)
            .with_line(ProductId::new(1), 2);

        let assembled = OrderAssembler::new().assemble(&request, &snapshot).unwrap();
        assert_eq!(assembled.lines.len(), 2);
        assert_eq!(assembled.total, Money::from_cents(400));
    }

    #[test]
    fn zero_price_is_fatal() {
        let snapshot: ProductSnapshot = [product(1, 0, 5)].into_iter().collect();
        let err = OrderAssembler::new()
            .assemble(&request().with_line(ProductId::new(1), 1), &snapshot)
            .unwrap_err();
        assert!(matches!(err, OrderError::Fatal { .. }));
    }

    #[test]
    fn subtotal_overflow_is_invalid_input() {
        let snapshot: ProductSnapshot =
            [product(1, i64::MAX / 2, u32::MAX)].into_iter().collect();
        let err = OrderAssembler::new()
            .assemble(&request().with_line(ProductId::new(1), 3), &snapshot)
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidInput { ref field, .. } if field == "lines[0].quantity"
        ));
    }

    #[test]
    fn total_may_reach_the_largest_amount() {
        let snapshot: ProductSnapshot = [product(1, i64::MAX / 3, 10), product(2, 1, 10)]
            .into_iter()
            .collect();

        let assembled = OrderAssembler::new()
            .assemble(
                &request()
                    .with_line(ProductId::new(1), 3)
                    .with_line(ProductId::new(2), 1),
                &snapshot,
            )
            .unwrap();
        assert_eq!(assembled.total, Money::from_cents(i64::MAX));

        let err = OrderAssembler::new()
            .assemble(
                &request()
                    .with_line(ProductId::new(1), 3)
                    .with_line(ProductId::new(2), 2),
                &snapshot,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidInput { ref field, .. } if field == "lines[1].quantity"
        ));
    }

    #[test]
    fn into_new_order_carries_request_metadata() {
        let snapshot: ProductSnapshot = [product(1, 250, 5)].into_iter().collect();
        let request = request()
            .with_line(ProductId::new(1), 2)
            .with_comment("fragile")
            .with_delivery_address("Av. Siempre Viva 742");
        let created_at = Utc::now();

        let new_order = OrderAssembler::new()
            .assemble(&request, &snapshot)
            .unwrap()
            .into_new_order(&request, OrderNumber::first(), created_at);

        assert_eq!(new_order.order_number, "PED-000001");
        assert_eq!(new_order.status, OrderStatus::Pending);
        assert_eq!(new_order.total, Money::from_cents(500));
        assert_eq!(new_order.comment.as_deref(), Some("fragile"));
        assert_eq!(
            new_order.delivery_address.as_deref(),
            Some("Av. Siempre Viva 742")
        );
        assert_eq!(new_order.created_at, created_at);
    }
}
