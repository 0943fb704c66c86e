//! Newtype row IDs for type-safe record references.
//!
//! Use the `define_row_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different record kinds. Row IDs are the table
//! row key of a record; new ones are UUID v4 strings.

/// Macro to define a type-safe row ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Default`
/// - Conversion methods: `new()`, `generate()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use abc_retailers_core::define_row_id;
/// define_row_id!(InvoiceId);
/// define_row_id!(ShipmentId);
///
/// let invoice_id = InvoiceId::generate();
/// let shipment_id = ShipmentId::new("shipment-1");
///
/// // These are different types, so this won't compile:
/// // let _: InvoiceId = shipment_id;
/// ```
#[macro_export]
macro_rules! define_row_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing row key.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh UUID v4 row key.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }

            /// Get the underlying row key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the row key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_row_id!(CustomerId);
define_row_id!(ProductId);
define_row_id!(OrderId);
