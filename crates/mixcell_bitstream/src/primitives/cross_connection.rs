//! A buffer carrying a signal from one routing matrix into another.

use super::PrimitiveKind;
use crate::address::EntityAddress;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::ConfigurationError;
use mixcell_common::MatrixId;

static INPUTS: [&str; 1] = ["IN"];
static OUTPUTS: [&str; 1] = ["OUT"];

/// Selects a net in its own matrix and drives net `oword` of `target`.
///
/// This is the only way a signal crosses matrices: an input selector can
/// only name nets of the matrix its selector word lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossConnection {
    address: EntityAddress,
    target: MatrixId,
    inputs: InputBindings,
}

impl CrossConnection {
    /// Creates a cross connection from `address.matrix` into `target`.
    pub fn new(address: EntityAddress, target: MatrixId) -> Result<Self, ConfigurationError> {
        if target == address.matrix {
            return Err(ConfigurationError::InvalidParameter(format!(
                "cross connection must target a matrix other than {target}"
            )));
        }
        Ok(Self {
            address,
            target,
            inputs: InputBindings::new(INPUTS.len()),
        })
    }

    /// The matrix the output drives.
    pub fn target(&self) -> MatrixId {
        self.target
    }
}

impl BitstreamEntity for CrossConnection {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::CrossConnection
    }

    fn output_matrix(&self) -> MatrixId {
        self.target
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &INPUTS
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn description(&self) -> String {
        format!(
            "XCONN {} ibase {} -> {} net {}",
            self.address.matrix, self.address.ibase, self.target, self.address.oword
        )
    }
}
