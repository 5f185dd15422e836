//! A device pin feeding a net of the routing matrix.

use super::PrimitiveKind;
use crate::address::EntityAddress;
use crate::entity::{BitstreamEntity, InputBindings};

static OUTPUTS: [&str; 1] = ["OUT"];

/// An external input that drives net `oword` and owns no configuration bits.
///
/// Pins give other entities something to connect to; saving and loading
/// them is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPin {
    address: EntityAddress,
    inputs: InputBindings,
}

impl InputPin {
    /// Creates a pin driving `address.oword`. `address.ibase` is unused.
    pub fn new(address: EntityAddress) -> Self {
        Self {
            address,
            inputs: InputBindings::new(0),
        }
    }
}

impl BitstreamEntity for InputPin {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::InputPin
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &[]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn description(&self) -> String {
        format!("PIN {} -> net {}", self.address.matrix, self.address.oword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcell_config::DeviceLayout;

    #[test]
    fn reserves_nothing() {
        let layout = DeviceLayout::slg46620_like();
        let pin = InputPin::new(EntityAddress::new(0, 0, 5));
        assert_eq!(pin.config_len(&layout.matrices[0]), 0);
        assert_eq!(pin.config_range(&layout), None);
        assert_eq!(pin.description(), "PIN m0 -> net 5");
    }
}
