//! Configuration bitstream entities for mixed-signal programmable devices.
//!
//! A device's configuration is one fixed-length bit array. Each placed
//! primitive (an inverter, a LUT, a counter, a pad buffer, ...) is a
//! [`BitstreamEntity`] that owns a contiguous range of those bits: one
//! selector word per input, naming the routing-matrix net that feeds it,
//! followed by the primitive's own state bits.
//!
//! The [`DeviceModel`] owns the image and every entity. It guarantees that
//! reservations never overlap and that each net has at most one driver,
//! resolves producer handles to nets when saving, and relinks decoded nets
//! back to producer handles after loading. The [`image`] module reads and
//! writes the image's text and byte encodings.

#![warn(missing_docs)]

pub mod address;
pub mod bits;
pub mod device;
pub mod entity;
pub mod error;
pub mod image;
pub mod primitives;

pub use address::{EntityAddress, NetAddress, PortRef};
pub use bits::BitArray;
pub use device::{CommitState, DeviceModel, EntitySummary};
pub use entity::{BitstreamEntity, InputBindings, InputSource, NetResolver};
pub use error::{
    ConfigurationError, EntityError, EntityFailure, ImageError, ModelError, SerializationError,
    WiringError,
};
pub use primitives::PrimitiveKind;
