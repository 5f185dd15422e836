//! Layout types deserialized from a device description.

use mixcell_common::MatrixId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The complete bit layout of one target device.
///
/// Matrices are addressed by their position in [`matrices`](Self::matrices):
/// the first `[[matrix]]` table is `MatrixId(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLayout {
    /// Device identification and image size.
    pub device: DeviceMeta,
    /// Routing matrices in declaration order.
    #[serde(rename = "matrix", default)]
    pub matrices: Vec<MatrixLayout>,
    /// Bit ranges owned by the device itself (trim, ID, lock bits).
    #[serde(default)]
    pub reserved: Vec<ReservedRange>,
}

/// Device identification and image size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// The device name, used in descriptions and reports.
    pub name: String,
    /// Total number of bits in the configuration image.
    pub bitstream_len: u32,
}

/// The selector region and net space of one routing matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixLayout {
    /// First image bit of the matrix's selector region.
    pub base: u32,
    /// Number of selector words in the region.
    pub words: u32,
    /// Width of one selector word in bits.
    pub selector_bits: u32,
    /// Number of nets a selector can name; values at or above this are invalid.
    pub nets: u32,
    /// Net permanently tied low, if the matrix has one.
    #[serde(default)]
    pub gnd_net: Option<u32>,
    /// Net permanently tied high, if the matrix has one.
    #[serde(default)]
    pub vdd_net: Option<u32>,
}

impl MatrixLayout {
    /// Returns the image bit range occupied by this matrix's selector words.
    ///
    /// The end saturates at `u32::MAX`; a validated layout never reaches it.
    pub fn region(&self) -> Range<u32> {
        let len = self.words.saturating_mul(self.selector_bits);
        self.base..self.base.saturating_add(len)
    }

    /// Returns the image bit offset of the given selector word, or `None`
    /// if it cannot be expressed as a 32-bit offset.
    pub fn word_offset(&self, word: u32) -> Option<u32> {
        word.checked_mul(self.selector_bits)?.checked_add(self.base)
    }

    /// Returns the number of distinct values a selector word can hold.
    pub fn selector_capacity(&self) -> u64 {
        1u64 << self.selector_bits
    }

    /// Returns the constant net for the given logic level.
    pub fn constant_net(&self, level: bool) -> Option<u32> {
        if level {
            self.vdd_net
        } else {
            self.gnd_net
        }
    }

    /// Returns the logic level of `net` if it is one of the constant nets.
    pub fn constant_level(&self, net: u32) -> Option<bool> {
        if self.gnd_net == Some(net) {
            Some(false)
        } else if self.vdd_net == Some(net) {
            Some(true)
        } else {
            None
        }
    }
}

/// A range of image bits that no entity may claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedRange {
    /// First reserved bit.
    pub start: u32,
    /// Number of reserved bits.
    pub len: u32,
    /// Why the bits are reserved.
    #[serde(default)]
    pub reason: String,
}

impl ReservedRange {
    /// Returns the reserved bits as a half-open range.
    pub fn range(&self) -> Range<u32> {
        self.start..self.start + self.len
    }
}

impl DeviceLayout {
    /// Returns the total number of bits in the configuration image.
    pub fn bitstream_len(&self) -> u32 {
        self.device.bitstream_len
    }

    /// Looks up a matrix by id.
    pub fn matrix(&self, id: MatrixId) -> Option<&MatrixLayout> {
        self.matrices.get(id.index())
    }

    /// Returns the ids of all matrices in declaration order.
    pub fn matrix_ids(&self) -> impl Iterator<Item = MatrixId> + '_ {
        (0..self.matrices.len() as u32).map(MatrixId::from_raw)
    }

    /// Returns the first reserved range that intersects `bits`, if any.
    pub fn reserved_overlap(&self, bits: &Range<u32>) -> Option<&ReservedRange> {
        self.reserved
            .iter()
            .find(|r| r.start < bits.end && bits.start < r.start + r.len)
    }
}
