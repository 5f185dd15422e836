//! Two- and four-way multiplexers.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::ConfigurationError;

static MUX2_INPUTS: [&str; 3] = ["IN0", "IN1", "SEL0"];
static MUX4_INPUTS: [&str; 6] = ["IN0", "IN1", "IN2", "IN3", "SEL0", "SEL1"];
static OUTPUTS: [&str; 1] = ["OUT"];

/// Drives `OUT` with the data input picked by the select inputs.
///
/// Data inputs come first in selector order, then the select lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mux {
    address: EntityAddress,
    width: u32,
    inputs: InputBindings,
}

impl Mux {
    /// Creates a 2- or 4-input mux.
    pub fn new(address: EntityAddress, width: u32) -> Result<Self, ConfigurationError> {
        let ports = match width {
            2 => MUX2_INPUTS.len(),
            4 => MUX4_INPUTS.len(),
            _ => {
                return Err(ConfigurationError::InvalidParameter(format!(
                    "mux width {width} is neither 2 nor 4"
                )))
            }
        };
        Ok(Self {
            address,
            width,
            inputs: InputBindings::new(ports),
        })
    }

    /// Number of data inputs.
    pub fn width(&self) -> u32 {
        self.width
    }
}

impl BitstreamEntity for Mux {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Mux
    }

    fn input_ports(&self) -> &'static [&'static str] {
        if self.width == 2 {
            &MUX2_INPUTS
        } else {
            &MUX4_INPUTS
        }
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn description(&self) -> String {
        placement(&format!("MUX{}", self.width), self.address)
    }
}
