//! Domain error types.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Buyer,
    Product,
    Order,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Buyer => write!(f, "Buyer"),
            Entity::Product => write!(f, "Product"),
            Entity::Order => write!(f, "Order"),
        }
    }
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A referenced buyer, product or order doesn't exist or is inactive.
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    /// The request failed validation before anything was touched.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Not enough stock, detected either when validating or when decrementing.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Concurrent updates kept colliding until the retry budget ran out.
    #[error("Concurrent update conflict after {attempts} attempt(s)")]
    Conflict { attempts: u32 },

    /// The unit of work didn't finish in time and was rolled back.
    #[error("Order creation timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// Stored data is corrupt. Never retried.
    #[error("Fatal: {reason}")]
    Fatal { reason: String },

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl OrderError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        OrderError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        OrderError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        OrderError::Fatal {
            reason: reason.into(),
        }
    }

    /// Returns true if a fresh attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Conflict { .. } | OrderError::Timeout { .. })
    }

    /// Stable machine-readable name, used for metric labels and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::NotFound { .. } => "not_found",
            OrderError::InvalidInput { .. } => "invalid_input",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::Conflict { .. } => "conflict",
            OrderError::Timeout { .. } => "timeout",
            OrderError::Fatal { .. } => "fatal",
            OrderError::Storage(_) => "storage",
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { .. } => OrderError::Conflict { attempts: 1 },
            StoreError::InvalidData { reason } => OrderError::Fatal { reason },
            other => OrderError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_becomes_retryable_conflict() {
        let err = OrderError::from(StoreError::Conflict {
            reason: "unique_order_number".to_string(),
        });
        assert!(matches!(err, OrderError::Conflict { attempts: 1 }));
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_stored_data_is_fatal() {
        let err = OrderError::from(StoreError::InvalidData {
            reason: "negative count -1".to_string(),
        });
        assert!(matches!(err, OrderError::Fatal { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn only_conflict_and_timeout_are_retryable() {
        assert!(OrderError::Timeout { attempts: 1 }.is_retryable());
        assert!(!OrderError::not_found(Entity::Product, 7).is_retryable());
        assert!(!OrderError::invalid("lines", "must not be empty").is_retryable());
        assert!(
            !OrderError::InsufficientStock {
                product_id: ProductId::new(1),
                requested: 3,
                available: 2,
            }
            .is_retryable()
        );
        assert!(!OrderError::fatal("bad order number").is_retryable());
    }

    #[test]
    fn messages_carry_details() {
        let err = OrderError::InsufficientStock {
            product_id: ProductId::new(4),
            requested: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 4: requested 3, available 2"
        );
        assert_eq!(
            OrderError::not_found(Entity::Buyer, 12).to_string(),
            "Buyer not found: 12"
        );
    }
}
