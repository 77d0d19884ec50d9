//! Order lifecycle services for the grocery ordering backend.
//!
//! Each service is generic over the store traits it needs:
//! - [`AddressService`] keeps at most one default address per user
//! - [`CartService`] merges repeated adds into one line per product
//! - [`CheckoutService`] turns a cart snapshot into an order atomically
//! - [`TimelineService`] appends to an order's status history
//! - [`OrderQueryService`] serves ownership-checked reads

pub mod address;
pub mod cart;
pub mod error;
pub mod order;
pub mod pricing;

pub use address::{AddressDraft, AddressService};
pub use cart::{AddedItem, CartItem, CartService, CartSummary};
pub use error::{DomainError, Result};
pub use order::{
    CheckoutLine, CheckoutRequest, CheckoutService, DEFAULT_ORDER_NUMBER_ATTEMPTS,
    INITIAL_REMARKS, OrderDetails, OrderNumberGenerator, OrderQueryService, RandomOrderNumbers,
    TimelineService,
};
pub use pricing::{Charges, Totals};
