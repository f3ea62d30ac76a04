//! Order creation request.

use common::{BuyerId, ProductId};

use crate::error::OrderError;

/// Longest comment accepted, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Longest delivery address accepted, in characters.
pub const MAX_DELIVERY_ADDRESS_CHARS: usize = 200;

/// One requested line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLineRequest {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Request to create an order for a buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub buyer_id: BuyerId,
    pub comment: Option<String>,
    pub delivery_address: Option<String>,
    pub lines: Vec<OrderLineRequest>,
}

impl CreateOrderRequest {
    /// Creates an empty request for a buyer.
    pub fn new(buyer_id: BuyerId) -> Self {
        Self {
            buyer_id,
            comment: None,
            delivery_address: None,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, product_id: ProductId, quantity: u32) -> Self {
        self.lines.push(OrderLineRequest::new(product_id, quantity));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_delivery_address(mut self, address: impl Into<String>) -> Self {
        self.delivery_address = Some(address.into());
        self
    }

    /// Checks the request shape, returning the first violation found.
    ///
    /// Nothing here touches the store; references are resolved later.
    pub fn validate(&self) -> Result<(), OrderError> {
        if !self.buyer_id.is_valid() {
            return Err(OrderError::invalid("buyer_id", "must be greater than 0"));
        }

        if self.lines.is_empty() {
            return Err(OrderError::invalid("lines", "must contain at least one line"));
        }

        for (i, line) in self.lines.iter().enumerate() {
            if !line.product_id.is_valid() {
                return Err(OrderError::invalid(
                    format!("lines[{i}].product_id"),
                    "must be greater than 0",
                ));
            }
            if line.quantity == 0 {
                return Err(OrderError::invalid(
                    format!("lines[{i}].quantity"),
                    "must be greater than 0",
                ));
            }
        }

        check_length("comment", self.comment.as_deref(), MAX_COMMENT_CHARS)?;
        check_length(
            "delivery_address",
            self.delivery_address.as_deref(),
            MAX_DELIVERY_ADDRESS_CHARS,
        )?;

        Ok(())
    }
}

fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), OrderError> {
    match value {
        Some(text) if text.chars().count() > max => Err(OrderError::invalid(
            field,
            format!("must be at most {max} characters"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_for(buyer_id: i64) -> CreateOrderRequest {
        CreateOrderRequest::new(BuyerId::new(buyer_id))
    }

    fn product(id: i64) -> ProductId {
        ProductId::new(id)
    }

    fn field_of(result: Result<(), OrderError>) -> String {
        match result {
            Err(OrderError::InvalidInput { field, .. }) => field,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_passes() {
        let request = order_for(1)
            .with_line(product(1), 2)
            .with_line(product(2), 1)
            .with_comment("leave at the door")
            .with_delivery_address("Calle 10 #43-12");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_buyer() {
        let request = order_for(0).with_line(product(1), 1);
        assert_eq!(field_of(request.validate()), "buyer_id");
    }

    #[test]
    fn rejects_empty_lines() {
        let request = order_for(1);
        assert_eq!(field_of(request.validate()), "lines");
    }

    #[test]
    fn reports_offending_line_index() {
        let request = order_for(1).with_line(product(1), 1).with_line(product(2), 0);
        assert_eq!(field_of(request.validate()), "lines[1].quantity");

        let request = order_for(1).with_line(product(-3), 1);
        assert_eq!(field_of(request.validate()), "lines[0].product_id");
    }

    #[test]
    fn text_limits_count_characters_not_bytes() {
        let at_limit = "ñ".repeat(MAX_COMMENT_CHARS);
        assert!(at_limit.len() > MAX_COMMENT_CHARS);
        let request = order_for(1)
            .with_line(product(1), 1)
            .with_comment(at_limit);
        assert!(request.validate().is_ok());

        let request = order_for(1)
            .with_line(product(1), 1)
            .with_comment("x".repeat(MAX_COMMENT_CHARS + 1));
        assert_eq!(field_of(request.validate()), "comment");

        let request = order_for(1)
            .with_line(product(1), 1)
            .with_delivery_address("x".repeat(MAX_DELIVERY_ADDRESS_CHARS + 1));
        assert_eq!(field_of(request.validate()), "delivery_address");
    }
}
