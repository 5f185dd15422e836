//! Lookup tables of one to four inputs.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::bits::BitArray;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::{ConfigurationError, SerializationError};

static INPUTS: [&str; 4] = ["IN0", "IN1", "IN2", "IN3"];
static OUTPUTS: [&str; 1] = ["OUT"];

/// A lookup table whose output is row `IN0 + 2*IN1 + 4*IN2 + 8*IN3` of its
/// truth table.
///
/// The truth table occupies `2^order` state bits, row 0 first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut {
    address: EntityAddress,
    order: u8,
    truth_table: u16,
    inputs: InputBindings,
}

impl Lut {
    /// Creates an all-zero LUT with `order` inputs (1 to 4).
    pub fn new(address: EntityAddress, order: u8) -> Result<Self, ConfigurationError> {
        if !(1..=4).contains(&order) {
            return Err(ConfigurationError::InvalidParameter(format!(
                "LUT order {order} not in 1..=4"
            )));
        }
        Ok(Self {
            address,
            order,
            truth_table: 0,
            inputs: InputBindings::new(order as usize),
        })
    }

    /// Number of inputs.
    pub fn order(&self) -> u8 {
        self.order
    }

    /// Number of truth table rows.
    pub fn rows(&self) -> u32 {
        1 << self.order
    }

    /// The truth table, row 0 in bit 0.
    pub fn truth_table(&self) -> u16 {
        self.truth_table
    }

    /// Replaces the truth table. Bits above row `2^order - 1` are dropped.
    pub fn set_truth_table(&mut self, table: u16) {
        self.truth_table = table & self.mask();
    }

    /// Output for the given input row.
    pub fn output_for(&self, row: u32) -> bool {
        row < self.rows() && (self.truth_table >> row) & 1 == 1
    }

    fn mask(&self) -> u16 {
        ((1u32 << self.rows()) - 1) as u16
    }
}

impl BitstreamEntity for Lut {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Lut
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &INPUTS[..self.order as usize]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn state_len(&self) -> u32 {
        self.rows()
    }

    fn encode_state(&self, state: &mut BitArray) {
        state.write_field(0, self.rows(), u32::from(self.truth_table));
    }

    fn decode_state(&mut self, state: &BitArray) -> Result<(), SerializationError> {
        self.truth_table = state.read_field(0, self.rows()) as u16;
        Ok(())
    }

    fn description(&self) -> String {
        let width = (self.rows() as usize).div_ceil(4);
        format!(
            "{} [{:#0w$x}]",
            placement(&format!("LUT{}", self.order), self.address),
            self.truth_table,
            w = width + 2
        )
    }
}
