//! Error types for placement, wiring, and (de)serialization.
//!
//! Every failure carries a [`DiagnosticCode`] so the device model can
//! report it through a [`DiagnosticSink`](mixcell_diagnostics::DiagnosticSink)
//! in addition to returning it.

use crate::address::NetAddress;
use mixcell_common::{EntityId, MatrixId};
use mixcell_diagnostics::{Category, DiagnosticCode};
use std::fmt;
use std::ops::Range;

/// A placement or construction problem detected before any bits are written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The address names a matrix the layout does not have.
    #[error("unknown matrix {0}")]
    UnknownMatrix(MatrixId),

    /// The entity's bits do not fit inside its matrix's selector region.
    #[error("config bits {bits:?} fall outside matrix {matrix} region {region:?}")]
    OutsideMatrix {
        /// The matrix the entity was placed in.
        matrix: MatrixId,
        /// The bits the entity would reserve.
        bits: Range<u32>,
        /// The matrix's selector region.
        region: Range<u32>,
    },

    /// The entity's bits intersect another entity's reservation.
    #[error("config bits {bits:?} overlap {other} at {other_bits:?}")]
    Overlap {
        /// The bits the entity would reserve.
        bits: Range<u32>,
        /// The entity already holding the bits.
        other: EntityId,
        /// That entity's reservation.
        other_bits: Range<u32>,
    },

    /// The entity's bits intersect a range the device reserves for itself.
    #[error("config bits {bits:?} overlap reserved bits ({reason})")]
    Reserved {
        /// The bits the entity would reserve.
        bits: Range<u32>,
        /// Why the device reserves the range.
        reason: String,
    },

    /// An output would drive a net the matrix does not have.
    #[error("output net {net} is outside the {nets} nets of its matrix")]
    OutputOutOfRange {
        /// The net the output would drive.
        net: NetAddress,
        /// Number of nets in the matrix.
        nets: u32,
    },

    /// An output would drive a net tied to a constant level.
    #[error("output net {0} is a constant net")]
    ConstantOutput(NetAddress),

    /// An output would drive a net another entity already drives.
    #[error("net {net} is already driven by {driver}")]
    OutputCollision {
        /// The contested net.
        net: NetAddress,
        /// The entity already driving it.
        driver: EntityId,
    },

    /// A primitive parameter is out of its legal range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No free run of selector words or nets is large enough.
    #[error("matrix {matrix} has no room for {bits} config bits and {outputs} outputs")]
    Exhausted {
        /// The matrix searched.
        matrix: MatrixId,
        /// Configuration bits requested.
        bits: u32,
        /// Output nets requested.
        outputs: u32,
    },
}

impl ConfigurationError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            Self::UnknownMatrix(_) => 1,
            Self::OutsideMatrix { .. } => 2,
            Self::Overlap { .. } => 3,
            Self::Reserved { .. } => 4,
            Self::OutputOutOfRange { .. } => 5,
            Self::ConstantOutput(_) => 6,
            Self::OutputCollision { .. } => 7,
            Self::InvalidParameter(_) => 8,
            Self::Exhausted { .. } => 9,
        };
        DiagnosticCode::new(Category::Configuration, number)
    }
}

/// A problem with how an entity's inputs are bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WiringError {
    /// The entity has no input port with this name.
    #[error("no input port named `{0}`")]
    UnknownInputPort(String),

    /// The producer has no output port with this name.
    #[error("no output port named `{0}`")]
    UnknownOutputPort(String),

    /// A port reference points at an output index the producer lacks.
    #[error("{entity} has no output {output}")]
    UnknownOutputIndex {
        /// The producer.
        entity: EntityId,
        /// The requested output index.
        output: u32,
    },

    /// A handle does not name an entity of the device model.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The entity's address names a matrix the layout does not have.
    #[error("unknown matrix {0}")]
    UnknownMatrix(MatrixId),

    /// A required input has no source.
    #[error("input `{0}` is unconnected")]
    Unconnected(&'static str),

    /// The source net lives in a different matrix than the input's selector.
    #[error("input `{port}` is driven from {source_net}, outside matrix {matrix}")]
    CrossMatrix {
        /// The input port.
        port: &'static str,
        /// Where the source actually is.
        source_net: NetAddress,
        /// The matrix the selector can reach.
        matrix: MatrixId,
    },

    /// The source net number does not fit the selector word.
    #[error("input `{port}` selects net {net}, which does not fit in {width} bits")]
    SelectorOverflow {
        /// The input port.
        port: &'static str,
        /// The net number.
        net: u32,
        /// Selector width in bits.
        width: u32,
    },

    /// A constant source was requested but the matrix has no such net.
    #[error("input `{port}` wants constant {level}, but matrix {matrix} has no constant net for it")]
    NoConstantNet {
        /// The input port.
        port: &'static str,
        /// The constant's logic level (`true` is high).
        level: bool,
        /// The matrix lacking the net.
        matrix: MatrixId,
    },

    /// A raw source net fits the selector but the matrix has no such net.
    #[error("input `{port}` selects {net}, which the matrix does not have")]
    UnknownNet {
        /// The input port.
        port: &'static str,
        /// The requested net.
        net: NetAddress,
    },
}

impl WiringError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            Self::UnknownInputPort(_) => 101,
            Self::UnknownOutputPort(_) => 102,
            Self::UnknownOutputIndex { .. } => 103,
            Self::UnknownEntity(_) => 104,
            Self::UnknownMatrix(_) => 105,
            Self::Unconnected(_) => 106,
            Self::CrossMatrix { .. } => 107,
            Self::SelectorOverflow { .. } => 108,
            Self::NoConstantNet { .. } => 109,
            Self::UnknownNet { .. } => 110,
        };
        DiagnosticCode::new(Category::Wiring, number)
    }
}

/// A bit pattern that does not decode to a valid logical state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    /// A selector holds a value at or above the matrix's net count.
    #[error("input `{port}` selector holds {value}, but the matrix has only {nets} nets")]
    InvalidSelector {
        /// The input port.
        port: &'static str,
        /// The raw selector value.
        value: u32,
        /// Number of nets in the matrix.
        nets: u32,
    },

    /// A state field holds a reserved encoding.
    #[error("field `{field}` holds reserved value {value:#b}")]
    InvalidField {
        /// The state field.
        field: &'static str,
        /// The raw field value.
        value: u32,
    },

    /// The bit array is too short for the entity's reserved range.
    #[error("expected {expected} config bits, found {actual}")]
    Length {
        /// Bits the entity needs.
        expected: u32,
        /// Bits available.
        actual: u32,
    },

    /// The entity's selector words lie beyond any 32-bit image offset.
    #[error("selector word {ibase} is past the end of any addressable image")]
    AddressOverflow {
        /// The entity's first selector word.
        ibase: u32,
    },
}

impl SerializationError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            Self::InvalidSelector { .. } => 201,
            Self::InvalidField { .. } => 202,
            Self::Length { .. } => 203,
            Self::AddressOverflow { .. } => 204,
        };
        DiagnosticCode::new(Category::Serialization, number)
    }
}

/// A failure of one entity's save or load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// The entity's inputs could not be encoded.
    #[error(transparent)]
    Wiring(#[from] WiringError),

    /// The entity's bits could not be decoded.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl EntityError {
    /// Returns the diagnostic code of the underlying error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::Wiring(e) => e.code(),
            Self::Serialization(e) => e.code(),
        }
    }
}

/// An [`EntityError`] tagged with the entity it came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} ({description}): {error}")]
pub struct EntityFailure {
    /// The failing entity.
    pub entity: EntityId,
    /// The entity's description at the time of failure.
    pub description: String,
    /// What went wrong.
    pub error: EntityError,
}

/// Every entity failure from one whole-device save or load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError {
    /// Failures in entity order.
    pub failures: Vec<EntityFailure>,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [] => write!(f, "no entity failures"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl std::error::Error for ModelError {}

/// A malformed serialized image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// A text line could not be parsed.
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What is wrong with it.
        message: String,
    },

    /// The image has the wrong number of bits.
    #[error("image holds {actual} bits, expected {expected}")]
    Length {
        /// Bits the device needs.
        expected: u32,
        /// Bits found.
        actual: u32,
    },

    /// Padding bits past the last image bit are set.
    #[error("padding bits past the end of the image are not zero")]
    Padding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_carry_category_prefix() {
        assert_eq!(
            WiringError::Unconnected("IN").code().to_string(),
            "R106"
        );
        assert_eq!(
            ConfigurationError::InvalidParameter("x".into()).code().to_string(),
            "C008"
        );
        let err: EntityError = SerializationError::InvalidField {
            field: "pull",
            value: 3,
        }
        .into();
        assert_eq!(err.code().to_string(), "S202");
    }

    #[test]
    fn wiring_display() {
        let err = WiringError::SelectorOverflow {
            port: "IN",
            net: 70,
            width: 6,
        };
        assert_eq!(
            err.to_string(),
            "input `IN` selects net 70, which does not fit in 6 bits"
        );
    }

    #[test]
    fn model_error_summarizes() {
        let failure = EntityFailure {
            entity: EntityId::from_raw(2),
            description: "INV m0 ibase 4 -> net 1".into(),
            error: WiringError::Unconnected("IN").into(),
        };
        let err = ModelError {
            failures: vec![failure.clone(), failure],
        };
        assert_eq!(
            err.to_string(),
            "e2 (INV m0 ibase 4 -> net 1): input `IN` is unconnected (and 1 more)"
        );
    }
}
