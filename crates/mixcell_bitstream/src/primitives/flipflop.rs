//! D flip-flops with optional asynchronous reset.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::bits::BitArray;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::SerializationError;

static INPUTS: [&str; 3] = ["D", "CLK", "nRST"];
static OUTPUTS: [&str; 1] = ["Q"];

const HAS_RESET: u32 = 0;
const INIT: u32 = 1;
const INVERTED: u32 = 2;

/// A rising-edge D flip-flop.
///
/// `nRST` is active low and defaults to high, so it may be left
/// unconnected. State bits: reset enable, power-on value, output inversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flipflop {
    address: EntityAddress,
    /// Whether `nRST` clears the flip-flop.
    pub has_reset: bool,
    /// Power-on value of `Q`.
    pub init: bool,
    /// Whether `Q` is driven inverted.
    pub output_inverted: bool,
    inputs: InputBindings,
}

impl Flipflop {
    /// Creates a flip-flop with all options off and all inputs unconnected.
    pub fn new(address: EntityAddress) -> Self {
        Self {
            address,
            has_reset: false,
            init: false,
            output_inverted: false,
            inputs: InputBindings::new(INPUTS.len()),
        }
    }
}

impl BitstreamEntity for Flipflop {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Flipflop
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &INPUTS
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn input_default(&self, index: usize) -> Option<bool> {
        (index == 2).then_some(true)
    }

    fn state_len(&self) -> u32 {
        3
    }

    fn encode_state(&self, state: &mut BitArray) {
        state.set(HAS_RESET, self.has_reset);
        state.set(INIT, self.init);
        state.set(INVERTED, self.output_inverted);
    }

    fn decode_state(&mut self, state: &BitArray) -> Result<(), SerializationError> {
        self.has_reset = state.get(HAS_RESET);
        self.init = state.get(INIT);
        self.output_inverted = state.get(INVERTED);
        Ok(())
    }

    fn description(&self) -> String {
        let mut flags = vec![format!("init {}", u8::from(self.init))];
        if self.has_reset {
            flags.push("reset".to_string());
        }
        if self.output_inverted {
            flags.push("inverted".to_string());
        }
        format!("{} [{}]", placement("DFF", self.address), flags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_reset_has_default() {
        let ff = Flipflop::new(EntityAddress::new(0, 0, 1));
        assert_eq!(ff.input_default(0), None);
        assert_eq!(ff.input_default(1), None);
        assert_eq!(ff.input_default(2), Some(true));
    }

    #[test]
    fn state_bits() {
        let mut ff = Flipflop::new(EntityAddress::new(0, 0, 1));
        ff.init = true;
        ff.output_inverted = true;
        let mut state = BitArray::new(3);
        ff.encode_state(&mut state);
        assert_eq!(state.to_string(), "011");

        let mut back = Flipflop::new(EntityAddress::new(0, 0, 1));
        back.decode_state(&state).unwrap();
        assert_eq!(back, ff);
    }

    #[test]
    fn description_lists_options() {
        let mut ff = Flipflop::new(EntityAddress::new(1, 8, 2));
        assert_eq!(ff.description(), "DFF m1 ibase 8 -> net 2 [init 0]");
        ff.has_reset = true;
        ff.init = true;
        assert_eq!(ff.description(), "DFF m1 ibase 8 -> net 2 [init 1, reset]");
    }
}
