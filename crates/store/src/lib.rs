//! Persistence layer for the grocery ordering backend.
//!
//! Every multi-row invariant (single default address, additive cart merge,
//! all-or-nothing order creation, append-only status timeline) is enforced
//! here as one atomic unit of work, so callers never see partial state.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{
    AddressId, AddressType, CartLineId, Money, OrderId, OrderStatus, PaymentMethod, ProductId,
    StatusEventId, UserId,
};
pub use error::{ADDRESS_DEFAULT_CONSTRAINT, ORDER_NUMBER_CONSTRAINT, Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    Address, AddressFields, CartLine, CartLineDetail, CartUpsert, CreatedOrder, NewOrder,
    NewOrderLine, Order, OrderLine, Product, StatusChange, StatusEvent,
};
pub use postgres::PostgresStore;
pub use store::{AddressStore, CartStore, CatalogStore, OrderStore, Store};
