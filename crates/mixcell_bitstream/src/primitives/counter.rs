//! Down counters with a reload value and a configurable reset edge.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::bits::BitArray;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::{ConfigurationError, SerializationError};
use serde::{Deserialize, Serialize};
use std::fmt;

static INPUTS: [&str; 2] = ["CLK", "RST"];
static OUTPUTS: [&str; 1] = ["OUT"];

/// Which edges of `RST` reload the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetMode {
    /// Rising edges only.
    RisingEdge,
    /// Falling edges only.
    FallingEdge,
    /// Both edges.
    BothEdges,
}

impl ResetMode {
    fn bits(self) -> u32 {
        match self {
            Self::RisingEdge => 0b00,
            Self::FallingEdge => 0b01,
            Self::BothEdges => 0b10,
        }
    }

    fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0b00 => Some(Self::RisingEdge),
            0b01 => Some(Self::FallingEdge),
            0b10 => Some(Self::BothEdges),
            _ => None,
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RisingEdge => "rising",
            Self::FallingEdge => "falling",
            Self::BothEdges => "both",
        })
    }
}

/// A counter that counts `CLK` edges down from its reload value and pulses
/// `OUT` on reaching zero.
///
/// `RST` defaults to low. State bits: the `width`-bit reload value followed
/// by the 2-bit reset mode, where `0b11` is reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    address: EntityAddress,
    width: u32,
    reload: u16,
    reset_mode: ResetMode,
    inputs: InputBindings,
}

impl Counter {
    /// Creates an 8- or 14-bit counter with a zero reload value.
    pub fn new(address: EntityAddress, width: u32) -> Result<Self, ConfigurationError> {
        if width != 8 && width != 14 {
            return Err(ConfigurationError::InvalidParameter(format!(
                "counter width {width} is neither 8 nor 14"
            )));
        }
        Ok(Self {
            address,
            width,
            reload: 0,
            reset_mode: ResetMode::RisingEdge,
            inputs: InputBindings::new(INPUTS.len()),
        })
    }

    /// Counter width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Largest reload value the width allows.
    pub fn max_reload(&self) -> u16 {
        ((1u32 << self.width) - 1) as u16
    }

    /// The reload value.
    pub fn reload(&self) -> u16 {
        self.reload
    }

    /// Sets the reload value.
    pub fn set_reload(&mut self, reload: u16) -> Result<(), ConfigurationError> {
        if reload > self.max_reload() {
            return Err(ConfigurationError::InvalidParameter(format!(
                "reload {reload} exceeds the {}-bit counter maximum {}",
                self.width,
                self.max_reload()
            )));
        }
        self.reload = reload;
        Ok(())
    }

    /// The reset mode.
    pub fn reset_mode(&self) -> ResetMode {
        self.reset_mode
    }

    /// Sets the reset mode.
    pub fn set_reset_mode(&mut self, mode: ResetMode) {
        self.reset_mode = mode;
    }
}

impl BitstreamEntity for Counter {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Counter
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &INPUTS
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn input_default(&self, index: usize) -> Option<bool> {
        (index == 1).then_some(false)
    }

    fn state_len(&self) -> u32 {
        self.width + 2
    }

    fn encode_state(&self, state: &mut BitArray) {
        state.write_field(0, self.width, u32::from(self.reload));
        state.write_field(self.width, 2, self.reset_mode.bits());
    }

    fn decode_state(&mut self, state: &BitArray) -> Result<(), SerializationError> {
        let raw_mode = state.read_field(self.width, 2);
        let mode = ResetMode::from_bits(raw_mode).ok_or(SerializationError::InvalidField {
            field: "reset_mode",
            value: raw_mode,
        })?;
        self.reload = state.read_field(0, self.width) as u16;
        self.reset_mode = mode;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "{} [reload {}, {}]",
            placement(&format!("CNT{}", self.width), self.address),
            self.reload,
            self.reset_mode
        )
    }
}
