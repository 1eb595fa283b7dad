//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! Identifiers are opaque strings. Legacy records store some of them as JSON
//! numbers (`"Id": 3`), so deserialization accepts either form and always
//! yields the canonical string (`"3"`). Surrounding whitespace is trimmed at
//! every boundary so `" 3"` and `"3"` compare equal.

use thiserror::Error;

/// Errors that can occur when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input is empty or whitespace only.
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string, `Deserialize` from a string or an integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `parse()`, `as_str()`, `into_inner()`, `as_number()`
/// - `FromStr`, `Display`, `AsRef<str>`, and `From<u64>` implementations
///
/// # Example
///
/// ```rust
/// # use marketpulse_core::define_id;
/// define_id!(ProductId);
/// define_id!(OrderId);
///
/// let product_id = ProductId::parse("1").unwrap();
/// let order_id = OrderId::parse("1").unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` if nothing remains after trimming.
            pub fn parse(id: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err($crate::types::id::IdError::Empty(stringify!($name)));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Numeric value of the ID, if it is a plain decimal number.
            ///
            /// Used to allocate the next sequential ID.
            #[must_use]
            pub fn as_number(&self) -> Option<u64> {
                self.0.parse().ok()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                struct IdVisitor;

                impl ::serde::de::Visitor<'_> for IdVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                        f.write_str("a non-empty string or an integer identifier")
                    }

                    fn visit_str<E: ::serde::de::Error>(
                        self,
                        v: &str,
                    ) -> ::core::result::Result<Self::Value, E> {
                        $name::parse(v).map_err(E::custom)
                    }

                    fn visit_u64<E: ::serde::de::Error>(
                        self,
                        v: u64,
                    ) -> ::core::result::Result<Self::Value, E> {
                        Ok($name::from(v))
                    }

                    fn visit_i64<E: ::serde::de::Error>(
                        self,
                        v: i64,
                    ) -> ::core::result::Result<Self::Value, E> {
                        Ok($name(v.to_string()))
                    }
                }

                deserializer.deserialize_any(IdVisitor)
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(OrderId);
define_id!(ReviewId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ProductId::parse("  42 ").unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(id, ProductId::parse("42").unwrap());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(
            ProductId::parse("   "),
            Err(IdError::Empty("ProductId"))
        );
    }

    #[test]
    fn test_numeric_and_string_ids_compare_equal() {
        let from_number: ProductId = serde_json::from_str("7").unwrap();
        let from_string: ProductId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, ProductId::from(7));
    }

    #[test]
    fn test_serializes_as_string() {
        let id = ProductId::from(12);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12\"");
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
    }

    #[test]
    fn test_as_number() {
        assert_eq!(ProductId::from(5).as_number(), Some(5));
        assert_eq!(ProductId::parse("sku-5").unwrap().as_number(), None);
        assert_eq!(OrderId::from(u64::MAX).as_number(), Some(u64::MAX));
    }
}
