//! Type-safe identifier wrappers around [`u64`].
//!
//! Identifiers are handed out by counters owned by the simulation context
//! rather than generated from wall-clock time, so two runs with the same
//! seed and the same action sequence produce identical ids.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around [`u64`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// The first identifier a fresh counter hands out.
            pub const FIRST: Self = Self(1);

            /// Wrap a raw counter value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner counter value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// Return the identifier that follows this one, or `None` on
            /// counter overflow.
            pub const fn next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(raw) => Some(Self(raw)),
                    None => None,
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a planted crop instance.
    PlantId, "plant"
}

define_id! {
    /// Unique identifier for a player command queued for the next tick.
    CommandId, "cmd"
}
