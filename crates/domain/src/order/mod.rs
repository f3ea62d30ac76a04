//! Order creation: request validation, assembly, numbering and the
//! transactional service that ties them together.

mod assembler;
mod request;
mod sequence;
mod service;

pub use assembler::{AssembledOrder, OrderAssembler, ProductSnapshot};
pub use request::{
    CreateOrderRequest, MAX_COMMENT_CHARS, MAX_DELIVERY_ADDRESS_CHARS, OrderLineRequest,
};
pub use sequence::{ORDER_NUMBER_PREFIX, ORDER_NUMBER_WIDTH, OrderNumber};
pub use service::OrderService;
