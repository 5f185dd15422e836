//! The internal RC oscillator.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::bits::BitArray;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::SerializationError;
use serde::{Deserialize, Serialize};

static OUTPUTS: [&str; 1] = ["OUT"];

/// Output clock divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Divider {
    /// Undivided.
    Div1,
    /// Divide by 2.
    Div2,
    /// Divide by 4.
    Div4,
    /// Divide by 8.
    Div8,
}

impl Divider {
    /// The division ratio.
    pub fn ratio(self) -> u32 {
        1 << self.bits()
    }

    fn bits(self) -> u32 {
        match self {
            Self::Div1 => 0,
            Self::Div2 => 1,
            Self::Div4 => 2,
            Self::Div8 => 3,
        }
    }
}

/// A free-running clock source with no inputs.
///
/// State bits: enable, then the 2-bit divider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oscillator {
    address: EntityAddress,
    /// Whether the oscillator runs.
    pub enabled: bool,
    /// Output divider.
    pub divider: Divider,
    inputs: InputBindings,
}

impl Oscillator {
    /// Creates a stopped, undivided oscillator.
    pub fn new(address: EntityAddress) -> Self {
        Self {
            address,
            enabled: false,
            divider: Divider::Div1,
            inputs: InputBindings::new(0),
        }
    }
}

impl BitstreamEntity for Oscillator {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Oscillator
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &[]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn state_len(&self) -> u32 {
        3
    }

    fn encode_state(&self, state: &mut BitArray) {
        state.set(0, self.enabled);
        state.write_field(1, 2, self.divider.bits());
    }

    fn decode_state(&mut self, state: &BitArray) -> Result<(), SerializationError> {
        self.enabled = state.get(0);
        self.divider = match state.read_field(1, 2) {
            0 => Divider::Div1,
            1 => Divider::Div2,
            2 => Divider::Div4,
            _ => Divider::Div8,
        };
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "{} [{}, /{}]",
            placement("OSC", self.address),
            if self.enabled { "on" } else { "off" },
            self.divider.ratio()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcell_config::DeviceLayout;

    #[test]
    fn state_only_config() {
        let osc = Oscillator::new(EntityAddress::new(0, 40, 20));
        let layout = DeviceLayout::slg46620_like();
        assert_eq!(osc.config_len(&layout.matrices[0]), 3);
        assert_eq!(osc.config_range(&layout), Some(240..243));
    }

    #[test]
    fn state_roundtrip() {
        let mut osc = Oscillator::new(EntityAddress::new(0, 40, 20));
        osc.enabled = true;
        osc.divider = Divider::Div4;
        let mut state = BitArray::new(3);
        osc.encode_state(&mut state);
        assert_eq!(state.to_string(), "101");
        let mut back = Oscillator::new(EntityAddress::new(0, 40, 20));
        back.decode_state(&state).unwrap();
        assert_eq!(back, osc);
        assert_eq!(back.description(), "OSC m0 ibase 40 -> net 20 [on, /4]");
    }
}
