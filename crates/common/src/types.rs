use serde::{Deserialize, Serialize};

/// Defines a type-safe wrapper around a database row id.
///
/// Every entity in this system is keyed by a `BIGSERIAL` column, so the
/// wrappers all hold an `i64`. Distinct types keep an `OrderId` from being
/// passed where an `AddressId` is expected.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw row id.
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of an authenticated customer, issued by the auth collaborator.
    UserId
);
define_id!(
    /// Identifier of a saved delivery address.
    AddressId
);
define_id!(
    /// Identifier of one cart row.
    CartLineId
);
define_id!(
    /// Identifier of a catalog product.
    ProductId
);
define_id!(
    /// Internal identifier of an order. Customers see the order number instead.
    OrderId
);
define_id!(StatusEventId);
