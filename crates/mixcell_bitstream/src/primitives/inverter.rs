//! A single-input logic inverter.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::entity::{BitstreamEntity, InputBindings};

static INPUTS: [&str; 1] = ["IN"];
static OUTPUTS: [&str; 1] = ["OUT"];

/// Drives `OUT` with the complement of `IN`.
///
/// The inverter has no state: its configuration is the single selector
/// word choosing the net that feeds `IN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inverter {
    address: EntityAddress,
    inputs: InputBindings,
}

impl Inverter {
    /// Creates an inverter with `IN` unconnected.
    pub fn new(address: EntityAddress) -> Self {
        Self {
            address,
            inputs: InputBindings::new(INPUTS.len()),
        }
    }
}

impl BitstreamEntity for Inverter {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Inverter
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &INPUTS
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn description(&self) -> String {
        placement("INV", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcell_config::DeviceLayout;

    #[test]
    fn ports_and_description() {
        let inv = Inverter::new(EntityAddress::new(0, 4, 9));
        assert_eq!(inv.input_ports(), ["IN"]);
        assert_eq!(inv.output_ports(), ["OUT"]);
        assert_eq!(inv.description(), "INV m0 ibase 4 -> net 9");
        assert_eq!(inv.kind(), PrimitiveKind::Inverter);
    }

    #[test]
    fn config_len_is_one_selector() {
        let inv = Inverter::new(EntityAddress::new(0, 4, 1));
        assert_eq!(inv.config_len(&DeviceLayout::tiny(64).matrices[0]), 1);
        assert_eq!(inv.config_len(&DeviceLayout::slg46620_like().matrices[0]), 6);
    }
}
