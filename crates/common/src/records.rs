//! Buyer, product and order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuyerId, Money, OrderId, ProductId};

/// A registered buyer. Owned by user management; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: BuyerId,
    pub name: String,
    pub email: String,
    pub active: bool,
}

/// A catalog product as seen at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Current unit price.
    pub price: Money,
    /// Units available to order.
    pub stock: u32,
    pub active: bool,
}

/// Lifecycle status of an order.
///
/// Orders are only ever created as `Pending`; later transitions belong to
/// fulfilment and are not modelled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A line of an assembled order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price captured from the product at assembly time.
    pub unit_price: Money,
    /// `quantity * unit_price`, computed once at assembly.
    pub subtotal: Money,
}

/// An assembled order, ready to be written by a store transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer_id: BuyerId,
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    /// Sum of the line subtotals.
    pub total: Money,
    pub comment: Option<String>,
    pub delivery_address: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A persisted order with its lines in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Money,
    pub comment: Option<String>,
    pub delivery_address: Option<String>,
    /// Cleared by soft deletion.
    pub active: bool,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    /// Materialises the persisted form once the store has assigned ids.
    ///
    /// `line_ids` must be in the same order as `self.lines`.
    pub fn into_order(self, id: OrderId, line_ids: impl IntoIterator<Item = i64>) -> Order {
        let lines = self
            .lines
            .into_iter()
            .zip(line_ids)
            .map(|(line, line_id)| OrderLine {
                id: line_id,
                order_id: id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            })
            .collect();

        Order {
            id,
            buyer_id: self.buyer_id,
            order_number: self.order_number,
            created_at: self.created_at,
            status: self.status,
            total: self.total,
            comment: self.comment,
            delivery_address: self.delivery_address,
            active: true,
            lines,
        }
    }
}

impl Order {
    /// Sum of the line subtotals.
    pub fn line_total(&self) -> Money {
        self.lines.iter().map(|l| l.subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_order() -> NewOrder {
        NewOrder {
            buyer_id: BuyerId::new(1),
            order_number: "PED-000001".to_string(),
            created_at: Utc::now(),
            status: OrderStatus::Pending,
            total: Money::from_cents(25000),
            comment: Some("leave at door".to_string()),
            delivery_address: None,
            lines: vec![
                NewOrderLine {
                    product_id: ProductId::new(1),
                    quantity: 2,
                    unit_price: Money::from_cents(10000),
                    subtotal: Money::from_cents(20000),
                },
                NewOrderLine {
                    product_id: ProductId::new(2),
                    quantity: 1,
                    unit_price: Money::from_cents(5000),
                    subtotal: Money::from_cents(5000),
                },
            ],
        }
    }

    #[test]
    fn into_order_assigns_ids_in_line_order() {
        let order = new_order().into_order(OrderId::new(9), [100, 101]);

        assert_eq!(order.id, OrderId::new(9));
        assert!(order.active);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].id, 100);
        assert_eq!(order.lines[0].product_id, ProductId::new(1));
        assert_eq!(order.lines[1].id, 101);
        assert!(order.lines.iter().all(|l| l.order_id == OrderId::new(9)));
        assert_eq!(order.line_total(), order.total);
    }

    #[test]
    fn status_round_trips_through_str() {
        let status: OrderStatus = "Pending".parse().unwrap();
        assert_eq!(status, OrderStatus::Pending);
        assert_eq!(status.to_string(), "Pending");
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }
}
