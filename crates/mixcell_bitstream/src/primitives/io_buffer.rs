//! Bidirectional pad buffers.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::bits::BitArray;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::SerializationError;
use serde::{Deserialize, Serialize};
use std::fmt;

static INPUTS: [&str; 2] = ["IN", "OE"];
static OUTPUTS: [&str; 1] = ["OUT"];

/// Which way the pad is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Input and output both off.
    Disabled,
    /// The pad drives `OUT`.
    Input,
    /// `IN` drives the pad.
    Output,
    /// Both, with `OE` gating the output driver.
    Bidirectional,
}

/// Pad pull resistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pull {
    /// Floating.
    None,
    /// Pull-down.
    Down,
    /// Pull-up.
    Up,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Input => "input",
            Self::Output => "output",
            Self::Bidirectional => "bidir",
        })
    }
}

const DIRECTION: u32 = 0;
const PULL: u32 = 2;
const DRIVE: u32 = 4;
const SCHMITT: u32 = 5;

/// A pad buffer between a device pin and the routing matrix.
///
/// `IN` is the value driven onto the pad and `OE` its output enable, which
/// defaults to high. `OUT` carries the pad's level into the matrix.
/// State bits: 2-bit direction, 2-bit pull (`0b11` reserved), double drive,
/// Schmitt trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoBuffer {
    address: EntityAddress,
    /// Pad direction.
    pub direction: Direction,
    /// Pull resistor.
    pub pull: Pull,
    /// Whether the output uses double drive strength.
    pub double_drive: bool,
    /// Whether the input has a Schmitt trigger.
    pub schmitt: bool,
    inputs: InputBindings,
}

impl IoBuffer {
    /// Creates a disabled, floating buffer.
    pub fn new(address: EntityAddress) -> Self {
        Self {
            address,
            direction: Direction::Disabled,
            pull: Pull::None,
            double_drive: false,
            schmitt: false,
            inputs: InputBindings::new(INPUTS.len()),
        }
    }
}

impl BitstreamEntity for IoBuffer {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::IoBuffer
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &INPUTS
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn input_default(&self, index: usize) -> Option<bool> {
        (index == 1).then_some(true)
    }

    fn state_len(&self) -> u32 {
        6
    }

    fn encode_state(&self, state: &mut BitArray) {
        let direction = match self.direction {
            Direction::Disabled => 0,
            Direction::Input => 1,
            Direction::Output => 2,
            Direction::Bidirectional => 3,
        };
        let pull = match self.pull {
            Pull::None => 0,
            Pull::Down => 1,
            Pull::Up => 2,
        };
        state.write_field(DIRECTION, 2, direction);
        state.write_field(PULL, 2, pull);
        state.set(DRIVE, self.double_drive);
        state.set(SCHMITT, self.schmitt);
    }

    fn decode_state(&mut self, state: &BitArray) -> Result<(), SerializationError> {
        let pull = match state.read_field(PULL, 2) {
            0 => Pull::None,
            1 => Pull::Down,
            2 => Pull::Up,
            value => {
                return Err(SerializationError::InvalidField {
                    field: "pull",
                    value,
                })
            }
        };
        self.direction = match state.read_field(DIRECTION, 2) {
            0 => Direction::Disabled,
            1 => Direction::Input,
            2 => Direction::Output,
            _ => Direction::Bidirectional,
        };
        self.pull = pull;
        self.double_drive = state.get(DRIVE);
        self.schmitt = state.get(SCHMITT);
        Ok(())
    }

    fn description(&self) -> String {
        let pull = match self.pull {
            Pull::None => "",
            Pull::Down => ", pull-down",
            Pull::Up => ", pull-up",
        };
        format!("{} [{}{pull}]", placement("IOB", self.address), self.direction)
    }
}
