//! # Identity Value Objects
//!
//! Type-safe identity wrappers for domain identifiers.
//!
//! ## UUID-based Identifiers
//!
//! - [`QuoteId`] - Provisional/reserved quote identifier
//! - [`ReservationId`] - Reservation identifier
//! - [`DepositId`] - Deposit record identifier
//! - [`ExecutionId`] - Execution record identifier
//!
//! ## String-based Identifiers
//!
//! - [`VenueId`] - Venue identifier (OTC desk, DEX pool, FX feed)
//! - [`ClientId`] - Client identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates an id from an existing UUID.
            #[inline]
            #[must_use]
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generates a new random id using UUID v4.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the inner UUID value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> Uuid {
                self.0
            }

            /// Returns the first eight characters of the simple (unhyphenated)
            /// form, used in human-facing references.
            #[must_use]
            pub fn short(&self) -> String {
                let mut buf = [0u8; 32];
                let simple = self.0.simple().encode_lower(&mut buf);
                simple[..8].to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id! {
    /// Quote identifier.
    ///
    /// Identifies a priced route through its provisional and reserved
    /// lifecycle. The same id addresses both records; the reserved record
    /// wins when both exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use corridor::domain::value_objects::QuoteId;
    ///
    /// let quote_id = QuoteId::new_v4();
    /// assert_eq!(quote_id.short().len(), 8);
    /// ```
    QuoteId
}

uuid_id! {
    /// Reservation identifier, assigned when a provisional quote is reserved.
    ReservationId
}

uuid_id! {
    /// Deposit record identifier.
    DepositId
}

uuid_id! {
    /// Execution record identifier.
    ExecutionId
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new id from a string.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the id as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the id and returns the inner String.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Venue identifier.
    ///
    /// A string-based identifier for pricing venues. DEX venues carry a
    /// `dex:` prefix by convention, which drives chain-id and duration
    /// mapping when a quote becomes a route step.
    ///
    /// # Examples
    ///
    /// ```
    /// use corridor::domain::value_objects::VenueId;
    ///
    /// let venue = VenueId::new("dex:orca");
    /// assert!(venue.is_dex());
    /// ```
    VenueId
}

string_id! {
    /// Client identifier supplied by the caller on reservation.
    ClientId
}

impl VenueId {
    /// Prefix marking on-chain DEX venues.
    pub const DEX_PREFIX: &'static str = "dex:";

    /// Returns true if this venue is a DEX (id begins with `dex:`).
    #[must_use]
    pub fn is_dex(&self) -> bool {
        self.0.starts_with(Self::DEX_PREFIX)
    }
}

impl ClientId {
    /// Returns up to the first eight characters, used in payment references.
    #[must_use]
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod quote_id {
        use super::*;

        #[test]
        fn new_v4_generates_unique_ids() {
            assert_ne!(QuoteId::new_v4(), QuoteId::new_v4());
        }

        #[test]
        fn display_formats_as_hyphenated() {
            let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
            let id = QuoteId::new(uuid);
            assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        }

        #[test]
        fn short_is_first_eight_simple_chars() {
            let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
            assert_eq!(QuoteId::new(uuid).short(), "550e8400");
        }

        #[test]
        fn serde_roundtrip() {
            let id = QuoteId::new_v4();
            let json = serde_json::to_string(&id).unwrap();
            let back: QuoteId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, back);
        }
    }

    mod venue_id {
        use super::*;

        #[test]
        fn dex_prefix_detection() {
            assert!(VenueId::new("dex:orca").is_dex());
            assert!(!VenueId::new("otc:transfero").is_dex());
            assert!(!VenueId::new("fx:openrates").is_dex());
        }

        #[test]
        fn display_and_as_str() {
            let venue = VenueId::new("otc:transfero");
            assert_eq!(venue.to_string(), "otc:transfero");
            assert_eq!(venue.as_str(), "otc:transfero");
        }

        #[test]
        fn hash_equality() {
            use std::collections::HashSet;
            let mut set = HashSet::new();
            set.insert(VenueId::new("dex:orca"));
            assert!(set.contains(&VenueId::new("dex:orca")));
        }
    }

    mod client_id {
        use super::*;

        #[test]
        fn short_truncates_long_ids() {
            assert_eq!(ClientId::new("client-12345").short(), "client-1");
        }

        #[test]
        fn short_keeps_short_ids_whole() {
            assert_eq!(ClientId::new("c1").short(), "c1");
        }
    }
}
