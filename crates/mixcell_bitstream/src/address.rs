//! Placement addresses and net references.

use mixcell_common::{EntityId, MatrixId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an entity sits in the device.
///
/// `ibase` is the first selector word the entity owns in `matrix`; its
/// input selectors occupy consecutive words from there, followed by its
/// state bits. `oword` is the net its first output drives in the output
/// matrix, and output `i` drives net `oword + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityAddress {
    /// Matrix holding the entity's selector words.
    pub matrix: MatrixId,
    /// First selector word owned by the entity.
    pub ibase: u32,
    /// Net driven by output port 0.
    pub oword: u32,
}

impl EntityAddress {
    /// Creates an address from raw matrix index, selector word, and output net.
    pub fn new(matrix: u32, ibase: u32, oword: u32) -> Self {
        Self {
            matrix: MatrixId::from_raw(matrix),
            ibase,
            oword,
        }
    }
}

impl fmt::Display for EntityAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ibase {} oword {}", self.matrix, self.ibase, self.oword)
    }
}

/// One net of one routing matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetAddress {
    /// The matrix the net belongs to.
    pub matrix: MatrixId,
    /// The net number, which is also the selector value that picks it.
    pub net: u32,
}

impl NetAddress {
    /// Creates a net address.
    pub fn new(matrix: MatrixId, net: u32) -> Self {
        Self { matrix, net }
    }
}

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.matrix, self.net)
    }
}

/// An output port of an entity, by arena handle and port index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// The producing entity.
    pub entity: EntityId,
    /// Index into the producer's output ports.
    pub output: u32,
}

impl PortRef {
    /// Creates a reference to output `output` of `entity`.
    pub fn new(entity: EntityId, output: u32) -> Self {
        Self { entity, output }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.output)
    }
}
