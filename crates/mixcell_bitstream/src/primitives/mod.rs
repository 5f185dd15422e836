//! The concrete primitives a device model can hold.
//!
//! Each primitive implements [`BitstreamEntity`](crate::entity::BitstreamEntity)
//! by naming its ports and, if it has any, packing its state fields into
//! the state bits that follow its input selectors.

/// Implements the accessor methods shared by every primitive.
///
/// Expects the primitive to have `address: EntityAddress` and
/// `inputs: InputBindings` fields.
macro_rules! entity_accessors {
    () => {
        fn address(&self) -> $crate::address::EntityAddress {
            self.address
        }

        fn bindings(&self) -> &$crate::entity::InputBindings {
            &self.inputs
        }

        fn bindings_mut(&mut self) -> &mut $crate::entity::InputBindings {
            &mut self.inputs
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

mod comparator;
mod counter;
mod cross_connection;
mod flipflop;
mod input_pin;
mod inverter;
mod io_buffer;
mod lut;
mod mux;
mod oscillator;

pub use comparator::{Comparator, Gain, Hysteresis, MAX_VREF_CODE};
pub use counter::{Counter, ResetMode};
pub use cross_connection::CrossConnection;
pub use flipflop::Flipflop;
pub use input_pin::InputPin;
pub use inverter::Inverter;
pub use io_buffer::{Direction, IoBuffer, Pull};
pub use lut::Lut;
pub use mux::Mux;
pub use oscillator::{Divider, Oscillator};

use crate::address::EntityAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a primitive, for summaries and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    /// [`Inverter`].
    Inverter,
    /// [`Lut`].
    Lut,
    /// [`Flipflop`].
    Flipflop,
    /// [`Counter`].
    Counter,
    /// [`Mux`].
    Mux,
    /// [`CrossConnection`].
    CrossConnection,
    /// [`Comparator`].
    Comparator,
    /// [`IoBuffer`].
    IoBuffer,
    /// [`InputPin`].
    InputPin,
    /// [`Oscillator`].
    Oscillator,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inverter => "inverter",
            Self::Lut => "lut",
            Self::Flipflop => "flipflop",
            Self::Counter => "counter",
            Self::Mux => "mux",
            Self::CrossConnection => "cross_connection",
            Self::Comparator => "comparator",
            Self::IoBuffer => "io_buffer",
            Self::InputPin => "input_pin",
            Self::Oscillator => "oscillator",
        };
        f.write_str(name)
    }
}

/// Formats `LABEL m0 ibase 4 -> net 1`.
fn placement(label: &str, address: EntityAddress) -> String {
    format!(
        "{label} {} ibase {} -> net {}",
        address.matrix, address.ibase, address.oword
    )
}
