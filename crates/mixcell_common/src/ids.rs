//! Opaque ID newtypes for device model handles.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, `Ord`, and
//! `Serialize`/`Deserialize`. An [`EntityId`] is an index into a device
//! model's entity arena; a [`MatrixId`] names one routing matrix.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize`, for arena lookups.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a bitstream entity owned by a device model.
    ///
    /// Entities refer to their producers through this handle rather than
    /// through references, so the device model stays the only owner.
    EntityId,
    "e"
);

define_id!(
    /// Identifies a routing matrix (a named routing domain) of the device.
    MatrixId,
    "m"
);
