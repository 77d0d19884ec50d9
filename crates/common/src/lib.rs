//! Shared value types for the grocery ordering backend.
//!
//! Everything here is plain data: typed identifiers, exact money amounts and
//! the enumerations persisted alongside orders and addresses.

pub mod money;
pub mod status;
pub mod types;

pub use money::Money;
pub use status::{AddressType, OrderStatus, PaymentMethod, UnknownVariant};
pub use types::{AddressId, CartLineId, OrderId, ProductId, StatusEventId, UserId};
